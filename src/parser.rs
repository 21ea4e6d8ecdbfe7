use crate::ast::{Condition, Conditional, Expr, Loop, Node, Template};
use crate::error::{ConvertError, StructuralError};
use crate::lexer::{Spanned, Token};
use crate::path::Path;

/// A block that has been opened but not yet closed.
enum Open {
    Loop {
        key: String,
        line: usize,
        body: Vec<Node>,
    },
    Condition {
        condition: Condition,
        line: usize,
        /// Filled once `ELSE` is seen; `nodes` then collects the else branch.
        then: Option<Vec<Node>>,
        nodes: Vec<Node>,
    },
}

impl Open {
    fn nodes(&mut self) -> &mut Vec<Node> {
        match self {
            Open::Loop { body, .. } => body,
            Open::Condition { nodes, .. } => nodes,
        }
    }

    fn unterminated(self) -> ConvertError {
        match self {
            Open::Loop { key, line, .. } => {
                ConvertError::structural(StructuralError::UnterminatedLoop { key }, line)
            }
            Open::Condition {
                condition, line, ..
            } => ConvertError::structural(
                StructuralError::UnterminatedCondition {
                    condition: condition.source,
                },
                line,
            ),
        }
    }
}

/// Builds the block tree, matching `BEGIN`/`END` and `IF`/`ELSE`/`ENDIF`
/// by nesting depth.
pub fn parse(tokens: Vec<Spanned>) -> Result<Template, ConvertError> {
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<Open> = Vec::new();

    for Spanned { token, line, .. } in tokens {
        match token {
            Token::Text(text) => push(&mut root, &mut stack, Node::Text(text)),
            Token::Variable(reference) => push(
                &mut root,
                &mut stack,
                Node::Interpolation(Expr::Reference(reference)),
            ),
            Token::Call(call) => {
                push(&mut root, &mut stack, Node::Interpolation(Expr::Call(call)))
            }
            Token::If(condition) => stack.push(Open::Condition {
                condition,
                line,
                then: None,
                nodes: Vec::new(),
            }),
            Token::Else => match stack.last_mut() {
                Some(Open::Condition {
                    condition,
                    then,
                    nodes,
                    ..
                }) => {
                    if then.is_some() {
                        return Err(ConvertError::structural(
                            StructuralError::DuplicateElse {
                                condition: condition.source.clone(),
                            },
                            line,
                        ));
                    }
                    *then = Some(std::mem::take(nodes));
                }
                _ => {
                    return Err(ConvertError::structural(
                        StructuralError::UnexpectedElse,
                        line,
                    ))
                }
            },
            Token::EndIf(closing) => match stack.pop() {
                Some(Open::Condition {
                    condition,
                    then,
                    nodes,
                    ..
                }) => {
                    let (then, otherwise) = match then {
                        Some(then) => (then, Some(nodes)),
                        None => (nodes, None),
                    };
                    let node = Node::Conditional(Conditional {
                        condition,
                        then,
                        otherwise,
                        closing,
                        closing_line: line,
                    });
                    push(&mut root, &mut stack, node);
                }
                Some(open @ Open::Loop { .. }) => return Err(open.unterminated()),
                None => {
                    return Err(ConvertError::structural(
                        StructuralError::UnexpectedEndIf { found: closing },
                        line,
                    ))
                }
            },
            Token::Begin(key) => stack.push(Open::Loop {
                key,
                line,
                body: Vec::new(),
            }),
            Token::End(found) => {
                let closes_open_loop = stack
                    .iter()
                    .any(|open| matches!(open, Open::Loop { key, .. } if *key == found));
                if !closes_open_loop {
                    // No BEGIN to close: keep the marker as literal text.
                    push(
                        &mut root,
                        &mut stack,
                        Node::Text(format!("<!-- END {} -->", found)),
                    );
                    continue;
                }
                if let Some(open) = stack.pop() {
                    match open {
                        Open::Loop {
                            key,
                            line: begin_line,
                            body,
                        } if key == found => {
                            let node = Node::Loop(Loop {
                                key: Path::parse(&key),
                                body,
                                line: begin_line,
                            });
                            push(&mut root, &mut stack, node);
                        }
                        Open::Loop { key, .. } => {
                            return Err(ConvertError::structural(
                                StructuralError::MismatchedEnd {
                                    expected: key,
                                    found,
                                },
                                line,
                            ))
                        }
                        open => return Err(open.unterminated()),
                    }
                }
            }
        }
    }

    match stack.pop() {
        Some(open) => Err(open.unterminated()),
        None => Ok(root),
    }
}

fn push(root: &mut Vec<Node>, stack: &mut [Open], node: Node) {
    match stack.last_mut() {
        Some(open) => open.nodes().push(node),
        None => root.push(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_str(source: &str) -> Result<Template, ConvertError> {
        parse(tokenize(source))
    }

    fn structural(source: &str) -> (StructuralError, usize) {
        match parse_str(source) {
            Err(ConvertError::Structural { kind, line }) => (kind, line),
            other => panic!("expected structural error, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_tree() {
        let tree = parse_str(
            "<!-- BEGIN a --><!-- IF x -->1<!-- ELSE -->2<!-- ENDIF x --><!-- END a -->",
        )
        .unwrap();
        assert_eq!(tree.len(), 1);
        let Node::Loop(outer) = &tree[0] else {
            panic!("expected loop");
        };
        assert_eq!(outer.key, Path::parse("a"));
        let Node::Conditional(cond) = &outer.body[0] else {
            panic!("expected conditional");
        };
        assert_eq!(cond.then, vec![Node::Text("1".to_string())]);
        assert_eq!(cond.otherwise, Some(vec![Node::Text("2".to_string())]));
        assert_eq!(cond.closing, "x");
    }

    #[test]
    fn test_same_key_nesting_matches_by_depth() {
        let tree =
            parse_str("<!-- BEGIN a -->x<!-- BEGIN a -->y<!-- END a -->z<!-- END a -->").unwrap();
        let Node::Loop(outer) = &tree[0] else {
            panic!("expected loop");
        };
        assert_eq!(outer.body.len(), 3);
        assert!(matches!(outer.body[1], Node::Loop(_)));
        assert_eq!(outer.body[2], Node::Text("z".to_string()));
    }

    #[test]
    fn test_unterminated_loop() {
        let (kind, line) = structural("one\n<!-- BEGIN items -->\n{items.name}");
        assert_eq!(
            kind,
            StructuralError::UnterminatedLoop {
                key: "items".to_string()
            }
        );
        assert_eq!(line, 2);
    }

    #[test]
    fn test_mismatched_end() {
        let (kind, line) = structural("<!-- BEGIN a -->\n<!-- BEGIN b -->\n<!-- END a -->");
        assert_eq!(
            kind,
            StructuralError::MismatchedEnd {
                expected: "b".to_string(),
                found: "a".to_string()
            }
        );
        assert_eq!(line, 3);
    }

    #[test]
    fn test_unknown_end_stays_text() {
        let tree = parse_str("<!-- BEGIN a -->x<!-- END b -->y<!-- END a -->").unwrap();
        let Node::Loop(outer) = &tree[0] else {
            panic!("expected loop");
        };
        assert_eq!(
            outer.body,
            vec![
                Node::Text("x".to_string()),
                Node::Text("<!-- END b -->".to_string()),
                Node::Text("y".to_string()),
            ]
        );

        let tree = parse_str("<!-- END a --> trailing").unwrap();
        assert_eq!(
            tree,
            vec![
                Node::Text("<!-- END a -->".to_string()),
                Node::Text(" trailing".to_string()),
            ]
        );

        let (kind, _) = structural("<!-- BEGIN a --><!-- END b -->");
        assert_eq!(
            kind,
            StructuralError::UnterminatedLoop {
                key: "a".to_string()
            }
        );
    }

    #[test]
    fn test_stray_markers() {
        assert_eq!(structural("<!-- ELSE -->").0, StructuralError::UnexpectedElse);
        assert_eq!(
            structural("<!-- ENDIF a -->").0,
            StructuralError::UnexpectedEndIf {
                found: "a".to_string()
            }
        );
    }

    #[test]
    fn test_unbalanced_conditions() {
        assert_eq!(
            structural("<!-- IF a -->x").0,
            StructuralError::UnterminatedCondition {
                condition: "a".to_string()
            }
        );
        assert_eq!(
            structural("<!-- IF a --><!-- ELSE --><!-- ELSE --><!-- ENDIF a -->").0,
            StructuralError::DuplicateElse {
                condition: "a".to_string()
            }
        );
        assert_eq!(
            structural("<!-- BEGIN l --><!-- IF a --><!-- END l -->").0,
            StructuralError::UnterminatedCondition {
                condition: "a".to_string()
            }
        );
    }
}
