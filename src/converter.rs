use log::debug;

use crate::ast::Node;
use crate::error::ConvertError;
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::scope::Scope;
use crate::variables::reject_raw_variables;

/// Knobs for a conversion. The defaults reproduce the legacy converter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Reject `ENDIF` markers whose payload does not repeat the opening `IF`.
    pub strict_endif: bool,
}

/// Converts legacy templates into Go `text/template` syntax.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Converts one template.
    ///
    /// Double braced variables are rejected before anything else is looked
    /// at; loop and condition markers must be balanced.
    pub fn convert(&self, source: &str) -> Result<String, ConvertError> {
        reject_raw_variables(source)?;

        let tokens = tokenize(source);
        debug!("tokenized {} bytes into {} tokens", source.len(), tokens.len());
        let template = parse(tokens)?;

        let mut emitter = Emitter {
            options: &self.options,
            scope: Scope::root(),
            out: String::with_capacity(source.len() * 2),
        };
        emitter.emit_nodes(&template)?;
        Ok(emitter.out)
    }
}

/// Walks the block tree, carrying the loop scope and the output buffer.
pub(crate) struct Emitter<'a> {
    pub(crate) options: &'a ConvertOptions,
    pub(crate) scope: Scope,
    pub(crate) out: String,
}

impl Emitter<'_> {
    pub(crate) fn emit_nodes(&mut self, nodes: &[Node]) -> Result<(), ConvertError> {
        for node in nodes {
            match node {
                Node::Text(text) => self.emit_text(text),
                Node::Interpolation(expr) => self.emit_interpolation(expr),
                Node::Conditional(conditional) => self.emit_conditional(conditional)?,
                Node::Loop(block) => self.emit_loop(block)?,
            }
        }
        Ok(())
    }
}

/// Converts `source` with default options.
pub fn convert(source: &str) -> Result<String, ConvertError> {
    Converter::default().convert(source)
}
