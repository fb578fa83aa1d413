//! rental-etl - load rental export files into the store

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use rental_etl::clock::{Clock, SystemClock};
use rental_etl::config::EtlConfig;
use rental_etl::ingestion::{CompositeObserver, Extractor, FileObserver, PipelineObserver, TracingObserver};
use rental_etl::load::JsonLinesStore;
use rental_etl::logging::init_logging;
use rental_etl::pipeline::Orchestrator;
use rental_etl::types::{FileReport, ValidationOutcome};
use rental_etl::validation::validate;

#[derive(Parser, Debug)]
#[command(name = "rental-etl")]
#[command(author, version, about = "Extract, validate, transform and load rental export files")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process every file in the input directory
    Run {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        processed: Option<PathBuf>,
        #[arg(long)]
        errors: Option<PathBuf>,
        /// Directory of the JSON-lines store
        #[arg(long)]
        output: Option<PathBuf>,
        /// Spreadsheet sheet to read instead of the first one
        #[arg(long)]
        sheet: Option<String>,
        /// Also append pipeline events to this file
        #[arg(long)]
        events_log: Option<PathBuf>,
    },

    /// Classify one file and show how each row validates, without loading or moving it
    Inspect {
        file: PathBuf,
        #[arg(long)]
        sheet: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = EtlConfig::load(cli.config.as_deref()).context("loading configuration")?;
    init_logging(&config.log).context("initialising logging")?;

    match cli.command {
        Command::Run {
            input,
            processed,
            errors,
            output,
            sheet,
            events_log,
        } => {
            if let Some(dir) = input {
                config.input_dir = dir;
            }
            if let Some(dir) = processed {
                config.processed_dir = dir;
            }
            if let Some(dir) = errors {
                config.errors_dir = dir;
            }
            if let Some(dir) = output {
                config.output_dir = dir;
            }
            if sheet.is_some() {
                config.sheet = sheet;
            }
            run(config, events_log)
        }
        Command::Inspect { file, sheet } => inspect(&config, file, sheet.or(config.sheet.clone())),
    }
}

fn run(config: EtlConfig, events_log: Option<PathBuf>) -> Result<()> {
    config.ensure_directories().context("creating data directories")?;
    let store = JsonLinesStore::open(&config.output_dir).context("opening store")?;

    let mut observers: Vec<Arc<dyn PipelineObserver>> = vec![Arc::new(TracingObserver)];
    if let Some(path) = events_log {
        observers.push(Arc::new(FileObserver::new(path)));
    }

    let mut orchestrator = Orchestrator::new(config, store).with_observer(Arc::new(CompositeObserver::new(observers)));
    let report = orchestrator.run()?;

    for (path, outcome) in &report.files {
        match outcome {
            FileReport::Processed(stats) => info!(
                path = %path.display(),
                total = stats.total,
                created = stats.created,
                errors = stats.errors.len(),
                "processed"
            ),
            FileReport::Failed { error } => info!(path = %path.display(), %error, "moved to errors"),
        }
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn inspect(config: &EtlConfig, file: PathBuf, sheet: Option<String>) -> Result<()> {
    let extractor = Extractor::new(config.input_dir.clone());
    let (kind, rows) = extractor
        .extract_entity(&file, sheet.as_deref())
        .with_context(|| format!("reading {}", file.display()))?;
    let now = SystemClock.now();

    println!("{}: {} ({} rows)", file.display(), kind, rows.len());
    for (idx, row) in rows.iter().enumerate() {
        match validate(kind, row, now) {
            Some(ValidationOutcome::Accepted) => println!("  row {}: ok", idx + 1),
            Some(ValidationOutcome::Rejected(reason)) => println!("  row {}: {reason}", idx + 1),
            None => println!("  row {}: no transformer for {kind}", idx + 1),
        }
    }
    Ok(())
}
