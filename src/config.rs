use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::converter::ConvertOptions;

#[derive(Debug, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub strict_endif: bool,
    pub jobs: Vec<JobConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JobConfig {
    pub name: Option<String>,
    /// A template file or a directory of templates.
    pub source: String,
    pub output: Option<String>,
    #[serde(default = "default_extension")]
    pub extension: String,
    /// minijinja template for output file names.
    #[serde(default = "default_output_name")]
    pub output_name: String,
    #[serde(default)]
    pub copy_other: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_extension() -> String {
    "tpl".to_string()
}

fn default_output_name() -> String {
    "{{ stem }}.tmpl".to_string()
}

fn default_enabled() -> bool {
    true
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl BatchConfig {
    /// Loads a config file, parsed as JSON when it has a `.json` extension
    /// and as YAML otherwise.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        if path.extension().map_or(false, |ext| ext == "json") {
            Ok(serde_json::from_str(&content)?)
        } else {
            Self::from_yaml(&content)
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            strict_endif: self.strict_endif,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = BatchConfig::from_yaml("jobs:\n  - source: templates\n").unwrap();
        assert!(!config.strict_endif);
        let job = &config.jobs[0];
        assert_eq!(job.source, "templates");
        assert_eq!(job.name, None);
        assert_eq!(job.output, None);
        assert_eq!(job.extension, "tpl");
        assert_eq!(job.output_name, "{{ stem }}.tmpl");
        assert!(!job.copy_other);
        assert!(job.enabled);
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
strict_endif: true
jobs:
  - name: forum
    source: views
    output: out
    extension: html
    output_name: "{{ job }}-{{ stem }}.gotmpl"
    copy_other: true
    enabled: false
"#;
        let config = BatchConfig::from_yaml(yaml).unwrap();
        assert!(config.convert_options().strict_endif);
        let job = &config.jobs[0];
        assert_eq!(job.name.as_deref(), Some("forum"));
        assert_eq!(job.extension, "html");
        assert_eq!(job.output_name, "{{ job }}-{{ stem }}.gotmpl");
        assert!(job.copy_other);
        assert!(!job.enabled);
    }

    #[test]
    fn test_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        fs::write(&path, r#"{"jobs": [{"source": "a.tpl", "output": "out"}]}"#).unwrap();
        let config = BatchConfig::load(&path).unwrap();
        assert_eq!(config.jobs[0].source, "a.tpl");
        assert_eq!(config.jobs[0].output.as_deref(), Some("out"));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            BatchConfig::load(&dir.path().join("missing.yaml")),
            Err(ConfigError::Io(_))
        ));
        let bad = dir.path().join("bad.yaml");
        fs::write(&bad, "jobs: 3").unwrap();
        assert!(matches!(BatchConfig::load(&bad), Err(ConfigError::Yaml(_))));
    }
}
