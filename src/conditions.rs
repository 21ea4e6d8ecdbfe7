use log::debug;

use crate::ast::{Condition, Conditional, Expr};
use crate::converter::Emitter;
use crate::error::{ConvertError, StructuralError};
use crate::variables::render_expr;

/// Whether an `ENDIF` payload repeats the condition it closes.
///
/// Spacing around argument commas is ignored, and a function condition may
/// be closed by its name alone.
pub fn closes(condition: &Condition, closing: &str) -> bool {
    let open = normalize(&condition.source);
    let close = normalize(closing);
    if open == close {
        return true;
    }
    matches!(condition.test, Expr::Call(_)) && open.split(',').next() == Some(close.as_str())
}

fn normalize(payload: &str) -> String {
    payload
        .split(',')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(",")
}

impl Emitter<'_> {
    pub(crate) fn emit_conditional(&mut self, conditional: &Conditional) -> Result<(), ConvertError> {
        let condition = &conditional.condition;
        if self.options.strict_endif && !closes(condition, &conditional.closing) {
            return Err(ConvertError::structural(
                StructuralError::MismatchedEndIf {
                    expected: condition.source.clone(),
                    found: conditional.closing.clone(),
                },
                conditional.closing_line,
            ));
        }

        let test = match &condition.test {
            // Function conditions keep the legacy spacing: `{{if  (f $)}}`.
            Expr::Call(_) => format!(" ({})", render_expr(&condition.test, &self.scope)),
            Expr::Reference(_) => render_expr(&condition.test, &self.scope),
        };
        debug!("condition {:?} -> {}", condition.source, test);

        self.out.push_str("{{if ");
        if condition.negated {
            self.out.push_str("not ");
        }
        self.out.push_str(&test);
        self.out.push_str("}}");

        self.emit_nodes(&conditional.then)?;
        if let Some(otherwise) = &conditional.otherwise {
            self.out.push_str("{{- else}}");
            self.emit_nodes(otherwise)?;
        }
        self.out.push_str("{{- end}}");
        Ok(())
    }
}
