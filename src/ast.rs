use crate::function::Call;
use crate::path::{Path, Reference};

/// A value position: an interpolation or the test of a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Reference(Reference),
    Call(Call),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub negated: bool,
    pub test: Expr,
    /// The marker payload as written, e.g. `!function.isAdmin, user`.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditional {
    pub condition: Condition,
    pub then: Vec<Node>,
    pub otherwise: Option<Vec<Node>>,
    /// Payload repeated on the `ENDIF` marker.
    pub closing: String,
    pub closing_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loop {
    pub key: Path,
    pub body: Vec<Node>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Interpolation(Expr),
    Conditional(Conditional),
    Loop(Loop),
}

pub type Template = Vec<Node>;
