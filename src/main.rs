use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use owl_importer::cli::Args;
use owl_importer::pipeline::{error_chain, import_file};
use owl_importer::{ImportConfig, MemoryStore};

/// Log to stderr and, without colours, to a fresh log file
fn init_logging(filter: &str, log_path: &Path) -> anyhow::Result<()> {
    let file = File::create(log_path)
        .with_context(|| format!("cannot create log file {}", log_path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config =
        ImportConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    if args.rollback {
        config.rollback_on_failure = true;
    }

    if !args.store.is_dir() {
        bail!("store directory {} does not exist", args.store.display());
    }
    if !args.input.is_file() {
        bail!("input file {} does not exist", args.input.display());
    }

    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| args.store.join(&config.log_file_name));
    init_logging(&config.log_filter, &log_path)?;

    let mut store = MemoryStore::open(&args.store)
        .with_context(|| format!("failed to open store {}", args.store.display()))?;

    // Import failures are reported, not turned into an exit code.
    match import_file(&args.input, &mut store, &config, args.options()) {
        Ok(summary) => {
            info!("{summary}");
            println!("{summary}");
            for warning in &summary.warnings {
                println!("Warning: {warning}");
            }
        }
        Err(err) => println!("Error: {}", error_chain(&err)),
    }

    store
        .save(&args.store)
        .with_context(|| format!("failed to save store {}", args.store.display()))?;
    Ok(())
}
