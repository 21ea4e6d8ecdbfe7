use log::{debug, error, info};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::JobConfig;
use crate::converter::Converter;
use crate::naming::{NamingError, OutputNamer};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Template source does not exist: {0:?}")]
    MissingSource(PathBuf),
    #[error("Failed to read directory {path:?}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Naming(#[from] NamingError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of one or more jobs. Paths are destinations for converted and
/// copied files and sources for failures.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub converted: Vec<PathBuf>,
    pub copied: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.converted.extend(other.converted);
        self.copied.extend(other.copied);
        self.failures.extend(other.failures);
    }
}

/// Converts the templates named by a [`JobConfig`] and writes the results.
///
/// A template that fails to convert is recorded in the report and does not
/// stop the job.
pub struct BatchConverter {
    converter: Converter,
    dry_run: bool,
}

impl BatchConverter {
    pub fn new(converter: Converter, dry_run: bool) -> Self {
        Self { converter, dry_run }
    }

    /// Runs `job`, resolving its source against `base_dir` and its output
    /// against `output_base`.
    pub fn run_job(
        &self,
        job: &JobConfig,
        base_dir: &Path,
        output_base: &Path,
    ) -> Result<BatchReport, BatchError> {
        let source = base_dir.join(&job.source);
        if !source.exists() {
            error!("Template source does not exist: {:?}", source);
            return Err(BatchError::MissingSource(source));
        }

        let output_dir = match &job.output {
            Some(out) => output_base.join(out),
            None => output_base.to_path_buf(),
        };
        let namer = OutputNamer::new(&job.output_name)?;
        let mut report = BatchReport::default();

        if source.is_file() {
            self.process(&source, &output_dir, job, &namer, true, &mut report)?;
        } else {
            for file in collect_files(&source)? {
                let relative = file
                    .parent()
                    .and_then(|parent| parent.strip_prefix(&source).ok())
                    .unwrap_or_else(|| Path::new(""));
                self.process(
                    &file,
                    &output_dir.join(relative),
                    job,
                    &namer,
                    false,
                    &mut report,
                )?;
            }
        }

        Ok(report)
    }

    fn process(
        &self,
        file: &Path,
        dest_dir: &Path,
        job: &JobConfig,
        namer: &OutputNamer,
        explicit: bool,
        report: &mut BatchReport,
    ) -> Result<(), BatchError> {
        let Some(file_name) = file.file_name().and_then(|name| name.to_str()) else {
            report.failures.push(FileFailure {
                path: file.to_path_buf(),
                error: "file name is not valid UTF-8".to_string(),
            });
            return Ok(());
        };

        let is_template = file
            .extension()
            .map_or(false, |ext| ext == job.extension.as_str());

        if explicit || is_template {
            let dest = dest_dir.join(namer.render(file_name, job.name.as_deref().unwrap_or(""))?);
            match self.convert_file(file, &dest) {
                Ok(()) => report.converted.push(dest),
                Err(e) => {
                    error!("Failed to convert {:?}: {}", file, e);
                    report.failures.push(FileFailure {
                        path: file.to_path_buf(),
                        error: e,
                    });
                }
            }
        } else if job.copy_other {
            let dest = dest_dir.join(file_name);
            match self.copy_file(file, &dest) {
                Ok(()) => report.copied.push(dest),
                Err(e) => {
                    error!("Failed to copy file from {:?} to {:?}", file, dest);
                    report.failures.push(FileFailure {
                        path: file.to_path_buf(),
                        error: e,
                    });
                }
            }
        } else {
            debug!("Skipping {:?}", file);
        }
        Ok(())
    }

    fn convert_file(&self, source: &Path, dest: &Path) -> Result<(), String> {
        let template = fs::read_to_string(source).map_err(|e| e.to_string())?;
        let converted = self
            .converter
            .convert(&template)
            .map_err(|e| e.to_string())?;

        if self.dry_run {
            info!("[DRY RUN] Would write: {:?}", dest);
            return Ok(());
        }
        ensure_parent_exists(dest)?;
        fs::write(dest, converted).map_err(|e| e.to_string())?;
        info!("{:?}", dest);
        Ok(())
    }

    fn copy_file(&self, source: &Path, dest: &Path) -> Result<(), String> {
        if self.dry_run {
            info!("[DRY RUN] Would copy: {:?}", dest);
            return Ok(());
        }
        ensure_parent_exists(dest)?;
        fs::copy(source, dest).map_err(|e| e.to_string())?;
        info!("{:?}", dest);
        Ok(())
    }
}

fn ensure_parent_exists(path: &Path) -> Result<(), String> {
    match path.parent() {
        Some(parent) if !parent.exists() => fs::create_dir_all(parent).map_err(|e| e.to_string()),
        _ => Ok(()),
    }
}

/// Lists the files under `dir` recursively, in sorted order.
fn collect_files(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let read_dir_error = |source| BatchError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = fs::read_dir(dir)
        .map_err(read_dir_error)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_dir_error)?;
    entries.sort();

    let mut files = Vec::new();
    for path in entries {
        if path.is_dir() {
            files.extend(collect_files(&path)?);
        } else {
            files.push(path);
        }
    }
    Ok(files)
}
