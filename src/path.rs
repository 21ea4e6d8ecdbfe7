/// The symbol every resolved path is rooted at.
pub const ROOT: &str = "$";

/// Loop-only tokens that are not field paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Special {
    Index,
    Key,
    Value,
    First,
}

impl Special {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "@index" => Some(Special::Index),
            "@key" => Some(Special::Key),
            "@value" => Some(Special::Value),
            "@first" => Some(Special::First),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Special::Index => "@index",
            Special::Key => "@key",
            Special::Value => "@value",
            Special::First => "@first",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    /// Array position, kept as the digits written in the template.
    Index(String),
    /// Trailing `length`, resolved to a size operation.
    Length,
}

/// A parsed legacy path such as `a.b[2].c` or `@index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Path {
    Special(Special),
    Fields(Vec<Segment>),
}

impl Path {
    /// Parses a path that already matched the lexer's key grammar.
    pub fn parse(raw: &str) -> Path {
        if let Some(special) = Special::from_token(raw) {
            return Path::Special(special);
        }

        let mut segments = Vec::new();
        let mut rest = raw;
        while let Some(c) = rest.chars().next() {
            match c {
                '.' => rest = &rest[1..],
                '[' => {
                    let inner = &rest[1..];
                    let (digits, tail) = inner.split_once(']').unwrap_or((inner, ""));
                    segments.push(Segment::Index(digits.to_string()));
                    rest = tail;
                }
                _ => {
                    let end = rest.find(['.', '[']).unwrap_or(rest.len());
                    segments.push(Segment::Field(rest[..end].to_string()));
                    rest = &rest[end..];
                }
            }
        }

        // `length` only means size when nothing follows it.
        if matches!(segments.last(), Some(Segment::Field(name)) if name == "length") {
            segments.pop();
            segments.push(Segment::Length);
        }

        Path::Fields(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        match self {
            Path::Special(_) => &[],
            Path::Fields(segments) => segments,
        }
    }
}

/// A path as written in a variable or condition, with its optional `../`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub parent: bool,
    pub path: Path,
}

impl Reference {
    pub fn new(parent: bool, raw: &str) -> Self {
        Self {
            parent,
            path: Path::parse(raw),
        }
    }
}

/// Applies `segments` as field accesses on top of the expression `base`.
pub fn apply(base: String, segments: &[Segment]) -> String {
    segments
        .iter()
        .fold(base, |expr, segment| match segment {
            Segment::Field(name) => format!("{}.{}", expr, name),
            Segment::Index(n) => format!("(index {} {})", expr, n),
            Segment::Length => format!("(len {})", expr),
        })
}

/// Resolves a legacy path against the root scope.
///
/// Special tokens are returned verbatim; binding them is the job of the
/// enclosing loop.
pub fn resolve_path(raw: &str) -> String {
    match Path::parse(raw) {
        Path::Special(special) => special.as_str().to_string(),
        Path::Fields(segments) => apply(ROOT.to_string(), &segments),
    }
}
