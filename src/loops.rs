use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::ast::Loop;
use crate::converter::Emitter;
use crate::error::ConvertError;
use crate::lexer::SPECIAL;
use crate::path::Special;

/// Special tokens written as bare text inside a loop body.
static BARE_SPECIAL: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"{}\b", SPECIAL)).unwrap());

impl Emitter<'_> {
    pub(crate) fn emit_loop(&mut self, block: &Loop) -> Result<(), ConvertError> {
        let frame = self.scope.enter(&block.key);
        debug!(
            "loop at line {} depth {}: range {} over {}",
            block.line,
            self.scope.depth(),
            frame.iterator,
            frame.collection
        );

        self.out.push_str(&format!(
            "{{{{range {}, {} := {}}}}}",
            frame.variable(),
            frame.value_variable(),
            frame.collection
        ));
        self.scope.push(frame);
        let body = self.emit_nodes(&block.body);
        self.scope.pop();
        body?;
        self.out.push_str("{{- end}}");
        Ok(())
    }

    /// Copies literal text, interpolating bare special tokens when inside a
    /// loop.
    pub(crate) fn emit_text(&mut self, text: &str) {
        match self.scope.innermost() {
            Some(frame) => {
                let replaced = BARE_SPECIAL.replace_all(text, |caps: &Captures<'_>| {
                    match Special::from_token(&caps[0]) {
                        Some(special) => format!("{{{{{}}}}}", frame.special(special)),
                        None => caps[0].to_string(),
                    }
                });
                self.out.push_str(&replaced);
            }
            None => self.out.push_str(text),
        }
    }
}
