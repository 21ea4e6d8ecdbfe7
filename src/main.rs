use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tplconv::{BatchConfig, BatchConverter, BatchReport, ConvertOptions, Converter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Reject ENDIF markers that do not repeat their IF condition
    #[arg(long, global = true)]
    strict: bool,

    /// Dry run mode - don't write files
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single template
    Convert {
        /// Template to convert, stdin when omitted or "-"
        input: Option<PathBuf>,

        /// Output file, stdout when omitted or "-"
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check that templates convert cleanly without writing anything
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Convert the jobs listed in a YAML or JSON configuration file
    Batch {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Base output directory (defaults to the config file's directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include patterns (glob or regex:pattern)
        #[arg(long)]
        include: Vec<String>,

        /// Exclude patterns (glob or regex:pattern)
        #[arg(long)]
        exclude: Vec<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let options = ConvertOptions {
        strict_endif: cli.strict,
    };

    match cli.command {
        Commands::Convert { input, output } => {
            convert(Converter::new(options), input.as_deref(), output.as_deref(), cli.dry_run)
        }
        Commands::Check { files } => check(Converter::new(options), &files),
        Commands::Batch {
            config,
            output,
            include,
            exclude,
        } => batch(
            &config,
            output.as_deref(),
            &include,
            &exclude,
            cli.strict,
            cli.dry_run,
        ),
    }
}

fn is_stdio(path: Option<&Path>) -> bool {
    path.map_or(true, |p| p == Path::new("-"))
}

fn convert(
    converter: Converter,
    input: Option<&Path>,
    output: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let source = if is_stdio(input) {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read template from stdin")?;
        buffer
    } else {
        let path = input.unwrap_or(Path::new("-"));
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read template {:?}", path))?
    };

    let converted = converter
        .convert(&source)
        .with_context(|| format!("Failed to convert {}", display_name(input)))?;

    match output {
        Some(path) if !is_stdio(Some(path)) => {
            if dry_run {
                info!("[DRY RUN] Would write: {:?}", path);
            } else {
                std::fs::write(path, converted)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                info!("{:?}", path);
            }
        }
        _ => {
            std::io::stdout()
                .write_all(converted.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn display_name(input: Option<&Path>) -> String {
    match input {
        Some(path) if !is_stdio(Some(path)) => format!("{:?}", path),
        _ => "<stdin>".to_string(),
    }
}

fn check(converter: Converter, files: &[PathBuf]) -> Result<()> {
    let mut failed = 0;
    for file in files {
        let source = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read template {:?}", file))?;
        match converter.convert(&source) {
            Ok(_) => info!("ok {:?}", file),
            Err(e) => {
                error!("{:?}: {}", file, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} templates failed to convert", failed, files.len());
    }
    Ok(())
}

fn batch(
    config_path: &Path,
    output: Option<&Path>,
    include: &[String],
    exclude: &[String],
    strict: bool,
    dry_run: bool,
) -> Result<()> {
    info!("Loading config from {:?}", config_path);
    let config = BatchConfig::load(config_path).context("Failed to load config")?;

    let base_dir = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
    let output_base = output.map_or_else(|| base_dir.clone(), Path::to_path_buf);

    let mut options = config.convert_options();
    options.strict_endif |= strict;
    let batch = BatchConverter::new(Converter::new(options), dry_run);

    if dry_run {
        info!("=== DRY RUN MODE ===");
    }

    let mut report = BatchReport::default();
    for job in &config.jobs {
        if !job.enabled {
            continue;
        }

        if let Some(ref name) = job.name {
            if should_filter(name, include, exclude) {
                info!("Skipping job: {}", name);
                continue;
            }
        }

        let label = job.name.as_deref().unwrap_or(job.source.as_str());
        let job_report = batch
            .run_job(job, &base_dir, &output_base)
            .with_context(|| format!("Job {:?} failed", label))?;
        report.merge(job_report);
    }

    info!(
        "{} converted, {} copied, {} failed",
        report.converted.len(),
        report.copied.len(),
        report.failures.len()
    );
    if dry_run {
        info!("=== DRY RUN COMPLETE ===");
    }

    if !report.is_success() {
        for failure in &report.failures {
            warn!("{:?}: {}", failure.path, failure.error);
        }
        anyhow::bail!("{} templates failed to convert", report.failures.len());
    }
    Ok(())
}

fn should_filter(name: &str, include: &[String], exclude: &[String]) -> bool {
    if !include.is_empty() && !include.iter().any(|pattern| matches_pattern(name, pattern)) {
        return true;
    }
    exclude.iter().any(|pattern| matches_pattern(name, pattern))
}

fn matches_pattern(name: &str, pattern: &str) -> bool {
    if let Some(regex_pattern) = pattern.strip_prefix("regex:") {
        if let Ok(re) = regex::Regex::new(regex_pattern) {
            return re.is_match(name);
        }
    }

    if let Some((prefix, suffix)) = pattern.split_once('*') {
        if !suffix.contains('*') {
            return name.starts_with(prefix) && name.ends_with(suffix);
        }
    }

    name == pattern
}
