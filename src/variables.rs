use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::Expr;
use crate::converter::Emitter;
use crate::error::{line_of, ConvertError};
use crate::lexer::key_pattern;
use crate::scope::Scope;

static RAW_VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\{{\{{(?:\.\./)?{}\}}\}}", key_pattern())).unwrap());

/// Fails on the first `{{path}}` in `source`.
pub fn reject_raw_variables(source: &str) -> Result<(), ConvertError> {
    match RAW_VARIABLE.find(source) {
        Some(problem) => Err(ConvertError::UnsupportedSyntax {
            snippet: problem.as_str().to_string(),
            line: line_of(source, problem.start()),
        }),
        None => Ok(()),
    }
}

/// Renders a reference or call in the current scope, without delimiters.
pub(crate) fn render_expr(expr: &Expr, scope: &Scope) -> String {
    match expr {
        Expr::Reference(reference) => scope.resolve(reference.parent, &reference.path),
        Expr::Call(call) => call.render_with(|arg| scope.resolve(false, arg)),
    }
}

impl Emitter<'_> {
    pub(crate) fn emit_interpolation(&mut self, expr: &Expr) {
        let rendered = render_expr(expr, &self.scope);
        self.out.push_str("{{");
        self.out.push_str(&rendered);
        self.out.push_str("}}");
    }
}
