//! chatsift - classify a stream of server chat lines and accumulate edit records.
//!
//! Reads lines from stdin, feeds them through the classification pipeline on
//! a periodic processing tick, and echoes non-excluded lines to stdout.

mod config;
mod logging;

use anyhow::{Context, Result};
use chatsift_core::extract::ExtractionRules;
use chatsift_core::{
    CategoryTable, DisplaySink, Pipeline, load_category_file, load_excluded_tags, load_subjects,
    save_excluded_tags,
};
use chatsift_types::SessionKey;
use clap::Parser;
use logging::{LogConfig, LogFormat};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tracing::{info, warn};

use config::Config;

/// chatsift - stream classifier and edit-log accumulator.
#[derive(Parser, Debug)]
#[command(name = "chatsift")]
#[command(about = "Classify server chat lines and accumulate spatial edit records")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Exclude a tag from display for this run (repeatable); persisted
    #[arg(long = "exclude", value_name = "TAG")]
    excludes: Vec<String>,

    /// Enable verbose logging (INFO level for most targets)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging (per-line classification traces)
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "classify=debug").
    /// Can be specified multiple times. Targets are prefixed with
    /// "chatsift::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

/// Display collaborator: non-excluded lines echo to stdout, formatting
/// markers intact.
struct StdoutSink;

impl DisplaySink for StdoutSink {
    fn display(&mut self, text: &str) {
        println!("{text}");
    }
}

/// How many consecutive idle ticks a pending split-line fragment survives
/// before it is flushed as-is.
const PENDING_FLUSH_IDLE_TICKS: u32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load()?,
    };

    let category_file = load_category_file(&config.categories_path).with_context(|| {
        format!("loading category table from {}", config.categories_path.display())
    })?;
    let (table, pattern_errors) = CategoryTable::compile(category_file.categories);
    if !pattern_errors.is_empty() {
        warn!(
            target: "chatsift::startup",
            skipped = pattern_errors.len(),
            "some categories had non-compiling patterns and were skipped"
        );
    }
    info!(
        target: "chatsift::startup",
        categories = table.len(),
        rules = category_file.rules.len(),
        "loaded category table"
    );

    let registry = load_subjects(&config.subjects_path)
        .with_context(|| format!("loading subjects from {}", config.subjects_path.display()))?;

    let mut excluded = load_excluded_tags(&config.exclusions_path)?;
    let exclusions_changed = cli
        .excludes
        .iter()
        .fold(false, |changed, tag| excluded.insert(tag.clone()) || changed);
    if exclusions_changed {
        if let Some(parent) = config.exclusions_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        save_excluded_tags(&config.exclusions_path, &excluded)?;
    }

    let mut pipeline = Pipeline::new(table, Box::new(registry), Box::new(StdoutSink));
    pipeline.set_excluded_tags(excluded);
    pipeline.register_edit_extractor(ExtractionRules::new(category_file.rules));
    pipeline.set_session(SessionKey::new(config.server.clone(), config.dimension));
    info!(target: "chatsift::startup", session = %pipeline.session(), "pipeline ready");

    // Ingestion context: only ever touches the queue.
    let sender = pipeline.sender();
    let mut ingest = tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if sender.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(target: "chatsift::ingest", error = %e, "stdin read failed");
                    break;
                }
            }
        }
    });

    // Processing context: drain the queue completely once per tick.
    let mut ticker = tokio::time::interval(Duration::from_millis(config.tick_ms.max(1)));
    let mut ingest_done = false;
    let mut idle_ticks = 0u32;
    let mut total_lines = 0usize;
    loop {
        tokio::select! {
            _ = &mut ingest, if !ingest_done => {
                ingest_done = true;
            }
            _ = ticker.tick() => {
                let processed = pipeline.drain();
                total_lines += processed;
                if processed > 0 {
                    idle_ticks = 0;
                    continue;
                }
                if pipeline.has_pending() {
                    idle_ticks += 1;
                    if idle_ticks >= PENDING_FLUSH_IDLE_TICKS {
                        pipeline.flush_pending();
                        idle_ticks = 0;
                    }
                }
                if ingest_done {
                    break;
                }
            }
        }
    }

    // Ingestion finished: one final drain, then resolve any dangling fragment.
    total_lines += pipeline.drain();
    pipeline.flush_pending();

    info!(
        target: "chatsift::startup",
        lines = total_lines,
        edits = pipeline.edit_log().map_or(0, |log| log.len()),
        "stream ended"
    );
    Ok(())
}
