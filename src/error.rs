use thiserror::Error;

/// Errors returned by [`crate::convert`].
///
/// Conversion is all-or-nothing: when one of these is returned no partial
/// output is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("double braced variables are unsupported (line {line}, near {snippet:?})")]
    UnsupportedSyntax { snippet: String, line: usize },
    #[error("line {line}: {kind}")]
    Structural { kind: StructuralError, line: usize },
}

impl ConvertError {
    pub(crate) fn structural(kind: StructuralError, line: usize) -> Self {
        ConvertError::Structural { kind, line }
    }

    /// The 1-based line the error was detected on.
    pub fn line(&self) -> usize {
        match self {
            ConvertError::UnsupportedSyntax { line, .. } => *line,
            ConvertError::Structural { line, .. } => *line,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("<!-- BEGIN {key} --> has no matching <!-- END {key} -->")]
    UnterminatedLoop { key: String },
    #[error("<!-- END {found} --> reached while <!-- BEGIN {expected} --> is still open")]
    MismatchedEnd { expected: String, found: String },
    #[error("<!-- IF {condition} --> has no matching <!-- ENDIF -->")]
    UnterminatedCondition { condition: String },
    #[error("<!-- ELSE --> outside of a condition")]
    UnexpectedElse,
    #[error("second <!-- ELSE --> in <!-- IF {condition} -->")]
    DuplicateElse { condition: String },
    #[error("<!-- ENDIF {found} --> without an open <!-- IF -->")]
    UnexpectedEndIf { found: String },
    #[error("<!-- ENDIF {found} --> closes <!-- IF {expected} -->")]
    MismatchedEndIf { expected: String, found: String },
}

/// Returns the 1-based line number of byte offset `pos` in `source`.
pub(crate) fn line_of(source: &str, pos: usize) -> usize {
    source[..pos.min(source.len())].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_of() {
        let src = "a\nb\nc";
        assert_eq!(line_of(src, 0), 1);
        assert_eq!(line_of(src, 2), 2);
        assert_eq!(line_of(src, 4), 3);
        assert_eq!(line_of(src, 100), 3);
    }

    #[test]
    fn test_structural_message() {
        let err = ConvertError::structural(
            StructuralError::UnterminatedLoop {
                key: "items".to_string(),
            },
            3,
        );
        assert_eq!(
            err.to_string(),
            "line 3: <!-- BEGIN items --> has no matching <!-- END items -->"
        );
        assert_eq!(err.line(), 3);
    }
}
