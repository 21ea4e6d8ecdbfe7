use crate::path::{self, Path, Segment, Special, ROOT};

/// One loop nesting level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Iterator name without the `$` sigil, `i0` for the outermost loop.
    pub iterator: String,
    /// Expression of the collection being ranged over.
    pub collection: String,
    /// Expression of the current element: `(index collection $iterator)`.
    pub element: String,
    /// The collection path as a legacy reference would spell it from the
    /// root, `None` when the loop ranges over a special token.
    flat: Option<Vec<Segment>>,
}

impl Frame {
    pub fn variable(&self) -> String {
        format!("${}", self.iterator)
    }

    pub fn value_variable(&self) -> String {
        format!("${}_value", self.iterator)
    }

    pub fn special(&self, special: Special) -> String {
        match special {
            Special::Index | Special::Key => self.variable(),
            Special::Value => self.value_variable(),
            Special::First => format!("(not {})", self.variable()),
        }
    }

    /// Returns the segments after this loop's collection path when `segments`
    /// addresses a field of the current element.
    fn strip<'a>(&self, segments: &'a [Segment]) -> Option<&'a [Segment]> {
        let flat = self.flat.as_ref()?;
        if segments.len() > flat.len()
            && segments.starts_with(flat)
            && matches!(segments[flat.len()], Segment::Field(_))
        {
            Some(&segments[flat.len()..])
        } else {
            None
        }
    }
}

/// The stack of loops enclosing the node being converted.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    frames: Vec<Frame>,
}

impl Scope {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn innermost(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Resolves a path, honoring a `../` marker by skipping the innermost loop.
    pub fn resolve(&self, parent: bool, path: &Path) -> String {
        let frames = if parent {
            &self.frames[..self.frames.len().saturating_sub(1)]
        } else {
            &self.frames[..]
        };
        resolve_in(frames, path)
    }

    /// Builds the frame for a loop over `key` opened at the current depth.
    pub fn enter(&self, key: &Path) -> Frame {
        let iterator = format!("i{}", self.depth());
        let (collection, flat) = match key {
            Path::Special(_) => (resolve_in(&self.frames, key), None),
            Path::Fields(segments) => {
                let stripped = self
                    .frames
                    .iter()
                    .rev()
                    .find_map(|frame| frame.strip(segments).map(|rest| (frame, rest)));
                match (stripped, self.frames.last()) {
                    (Some((frame, rest)), _) => (
                        path::apply(frame.element.clone(), rest),
                        Some(segments.clone()),
                    ),
                    (None, Some(enclosing)) => (
                        path::apply(enclosing.element.clone(), segments),
                        enclosing
                            .flat
                            .as_ref()
                            .map(|flat| [flat.as_slice(), segments.as_slice()].concat()),
                    ),
                    (None, None) => (
                        path::apply(ROOT.to_string(), segments),
                        Some(segments.clone()),
                    ),
                }
            }
        };
        let element = format!("(index {} ${})", collection, iterator);
        Frame {
            iterator,
            collection,
            element,
            flat,
        }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }
}

fn resolve_in(frames: &[Frame], path: &Path) -> String {
    match path {
        Path::Special(special) => frames
            .last()
            .map_or_else(|| special.as_str().to_string(), |frame| frame.special(*special)),
        Path::Fields(segments) => {
            for frame in frames.iter().rev() {
                if let Some(rest) = frame.strip(segments) {
                    return path::apply(frame.element.clone(), rest);
                }
            }
            path::apply(ROOT.to_string(), segments)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope_with(keys: &[&str]) -> Scope {
        let mut scope = Scope::root();
        for key in keys {
            let frame = scope.enter(&Path::parse(key));
            scope.push(frame);
        }
        scope
    }

    #[test]
    fn test_root_scope() {
        let scope = Scope::root();
        assert_eq!(scope.resolve(false, &Path::parse("a.b")), "$.a.b");
        assert_eq!(scope.resolve(false, &Path::parse("@index")), "@index");
        assert_eq!(scope.resolve(true, &Path::parse("a")), "$.a");
    }

    #[test]
    fn test_top_level_frame() {
        let frame = Scope::root().enter(&Path::parse("items"));
        assert_eq!(frame.iterator, "i0");
        assert_eq!(frame.collection, "$.items");
        assert_eq!(frame.element, "(index $.items $i0)");
        assert_eq!(frame.special(Special::Index), "$i0");
        assert_eq!(frame.special(Special::Key), "$i0");
        assert_eq!(frame.special(Special::Value), "$i0_value");
        assert_eq!(frame.special(Special::First), "(not $i0)");
    }

    #[test]
    fn test_element_fields_are_rerooted() {
        let scope = scope_with(&["items"]);
        assert_eq!(
            scope.resolve(false, &Path::parse("items.name")),
            "(index $.items $i0).name"
        );
        assert_eq!(
            scope.resolve(false, &Path::parse("items.tags[1]")),
            "(index (index $.items $i0).tags 1)"
        );
        // Not addressing an element field.
        assert_eq!(scope.resolve(false, &Path::parse("items")), "$.items");
        assert_eq!(
            scope.resolve(false, &Path::parse("items.length")),
            "(len $.items)"
        );
        assert_eq!(
            scope.resolve(false, &Path::parse("items[0]")),
            "(index $.items 0)"
        );
        assert_eq!(scope.resolve(false, &Path::parse("name")), "$.name");
        assert_eq!(scope.resolve(false, &Path::parse("itemsx.a")), "$.itemsx.a");
    }

    #[test]
    fn test_nested_relative_key() {
        let scope = scope_with(&["items", "children"]);
        let inner = scope.innermost().unwrap();
        assert_eq!(inner.iterator, "i1");
        assert_eq!(inner.collection, "(index $.items $i0).children");
        assert_eq!(
            scope.resolve(false, &Path::parse("items.children.name")),
            "(index (index $.items $i0).children $i1).name"
        );
        assert_eq!(
            scope.resolve(false, &Path::parse("items.title")),
            "(index $.items $i0).title"
        );
    }

    #[test]
    fn test_nested_prefixed_key() {
        let relative = scope_with(&["items", "children"]);
        let prefixed = scope_with(&["items", "items.children"]);
        assert_eq!(
            relative.innermost().unwrap().collection,
            prefixed.innermost().unwrap().collection
        );
        assert_eq!(
            prefixed.resolve(false, &Path::parse("items.children.name")),
            "(index (index $.items $i0).children $i1).name"
        );
    }

    #[test]
    fn test_parent_reference_skips_innermost() {
        let scope = scope_with(&["items", "children"]);
        assert_eq!(scope.resolve(false, &Path::parse("@index")), "$i1");
        assert_eq!(scope.resolve(true, &Path::parse("@index")), "$i0");
        assert_eq!(
            scope.resolve(true, &Path::parse("items.children.name")),
            "(index $.items $i0).children.name"
        );
    }

    #[test]
    fn test_loop_over_value() {
        let scope = scope_with(&["rows", "@value"]);
        let inner = scope.innermost().unwrap();
        assert_eq!(inner.collection, "$i0_value");
        assert_eq!(inner.element, "(index $i0_value $i1)");
    }

    #[test]
    fn test_push_pop() {
        let mut scope = scope_with(&["a"]);
        assert_eq!(scope.depth(), 1);
        assert_eq!(scope.pop().map(|f| f.iterator), Some("i0".to_string()));
        assert_eq!(scope.depth(), 0);
    }
}
