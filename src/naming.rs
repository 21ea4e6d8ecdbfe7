use minijinja::{context, Environment, UndefinedBehavior};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NamingError {
    #[error("invalid output name template {pattern:?}: {source}")]
    Template {
        pattern: String,
        #[source]
        source: minijinja::Error,
    },
    #[error("output name template {pattern:?} rendered an empty name for {file:?}")]
    Empty { pattern: String, file: String },
}

/// Renders output file names from a minijinja pattern such as
/// `{{ stem }}.tmpl`.
///
/// Available variables: `stem`, `ext`, `name` (stem plus extension) and
/// `job`. Undefined variables are an error.
pub struct OutputNamer {
    env: Environment<'static>,
    pattern: String,
}

impl OutputNamer {
    pub fn new(pattern: &str) -> Result<Self, NamingError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.template_from_str(pattern)
            .map_err(|source| NamingError::Template {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            env,
            pattern: pattern.to_string(),
        })
    }

    /// Renders the output name for the source file `file_name`.
    pub fn render(&self, file_name: &str, job: &str) -> Result<String, NamingError> {
        let (stem, ext) = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, ext),
            _ => (file_name, ""),
        };
        let template_error = |source| NamingError::Template {
            pattern: self.pattern.clone(),
            source,
        };
        let template = self
            .env
            .template_from_str(&self.pattern)
            .map_err(template_error)?;
        let rendered = template
            .render(context! { stem => stem, ext => ext, name => file_name, job => job })
            .map_err(template_error)?;

        let rendered = rendered.trim().to_string();
        if rendered.is_empty() {
            return Err(NamingError::Empty {
                pattern: self.pattern.clone(),
                file: file_name.to_string(),
            });
        }
        Ok(rendered)
    }
}
