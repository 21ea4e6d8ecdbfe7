use crate::path::{self, Path, ROOT};

/// A `function.NAME, arg, …` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Path>,
}

impl Call {
    /// Builds a call from the captured name and the raw `, a, b` argument tail.
    pub fn parse(name: &str, raw_args: &str) -> Self {
        Self {
            name: name.to_string(),
            args: split_args(raw_args).into_iter().map(Path::parse).collect(),
        }
    }

    /// Renders `name $ arg…`, resolving each argument with `resolve`.
    pub fn render_with<F>(&self, resolve: F) -> String
    where
        F: Fn(&Path) -> String,
    {
        let mut call = format!("{} {}", self.name, ROOT);
        for arg in &self.args {
            call.push(' ');
            call.push_str(&resolve(arg));
        }
        call
    }
}

/// Splits `, a , b` into `["a", "b"]`.
fn split_args(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|arg| !arg.is_empty())
        .collect()
}

/// Resolves a call whose arguments are rooted at the document scope.
pub fn resolve_call(name: &str, args: &[&str]) -> String {
    let call = Call {
        name: name.to_string(),
        args: args.iter().map(|arg| Path::parse(arg)).collect(),
    };
    call.render_with(|arg| match arg {
        Path::Special(special) => special.as_str().to_string(),
        Path::Fields(segments) => path::apply(ROOT.to_string(), segments),
    })
}
