use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inkpage_core::{Annotation, EngineConfig, Session};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "inkpage-cli")]
#[command(about = "Inkpage annotation file tool")]
pub struct Cli {
    /// Engine config file (JSON). Defaults to the platform config dir.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log engine activity at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check that an export file imports cleanly.
    Validate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print annotation counts per page and per type.
    Stats {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Re-export a file in canonical form.
    Normalize {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct ValidateOutput {
    path: String,
    annotations: usize,
    pages: usize,
}

#[derive(Debug, Serialize)]
struct StatsOutput {
    path: String,
    total: usize,
    pages: BTreeMap<u32, usize>,
    types: BTreeMap<&'static str, usize>,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Validate { file } => run_validate(&file, cli.config.as_deref()),
        Commands::Stats { file } => run_stats(&file, cli.config.as_deref()),
        Commands::Normalize { file, output } => {
            run_normalize(&file, output.as_deref(), cli.config.as_deref())
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn,inkpage_core=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    if let Some(path) = path {
        return EngineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }

    let default_path = EngineConfig::default_path();
    if default_path.is_file() {
        debug!(path = %default_path.display(), "using default config file");
        return EngineConfig::from_file(&default_path)
            .with_context(|| format!("failed to load config {}", default_path.display()));
    }

    EngineConfig::from_env().context("invalid configuration in environment")
}

/// Import `file` into a fresh session
fn open_session(file: &Path, config: Option<&Path>) -> Result<Session> {
    ensure_file_exists(file)?;

    let json = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let mut session = Session::new(load_config(config)?);
    let count = session
        .import_all(&json)
        .with_context(|| format!("invalid annotation file {}", file.display()))?;
    info!(path = %file.display(), count, "loaded annotation file");

    Ok(session)
}

fn run_validate(file: &Path, config: Option<&Path>) -> Result<()> {
    let session = open_session(file, config)?;
    let annotations = session.annotations();

    let payload = ValidateOutput {
        path: file.display().to_string(),
        annotations: annotations.len(),
        pages: page_counts(annotations).len(),
    };

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn run_stats(file: &Path, config: Option<&Path>) -> Result<()> {
    let session = open_session(file, config)?;
    let annotations = session.annotations();

    let mut types = BTreeMap::new();
    for annotation in annotations {
        *types.entry(annotation.kind.as_str()).or_insert(0) += 1;
    }

    let payload = StatsOutput {
        path: file.display().to_string(),
        total: annotations.len(),
        pages: page_counts(annotations),
        types,
    };

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn run_normalize(file: &Path, output: Option<&Path>, config: Option<&Path>) -> Result<()> {
    let session = open_session(file, config)?;
    let json = session.export_all().context("failed to export annotations")?;

    match output {
        Some(output) => {
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(output, format!("{json}\n"))
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("{}", output.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn page_counts(annotations: &[Annotation]) -> BTreeMap<u32, usize> {
    let mut pages = BTreeMap::new();
    for annotation in annotations {
        *pages.entry(annotation.page_number).or_insert(0) += 1;
    }
    pages
}

fn ensure_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}
