//! One-off batch run.
//!
//! Scores a ticker universe for one as-of date. Records go to Postgres when a
//! database URL is given, otherwise they are written as JSON.

use anyhow::Result;
use clap::Args;
use confluence_data::{InMemoryRecordStore, RecordStore};
use confluence_scheduler::BatchRunner;
use std::sync::Arc;
use tokio::sync::watch;

use super::{connect, load_config, open_events, parse_date, parse_tickers};
use crate::display::format_summary;

/// Arguments for the run command.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,

    /// As-of date (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub as_of: Option<String>,

    /// Comma-separated tickers (defaults to the configured universe, then
    /// every ticker in the event source)
    #[arg(long)]
    pub tickers: Option<String>,

    /// Events file (JSON array or JSON lines)
    #[arg(long)]
    pub events: Option<String>,

    /// Database connection URL; records are persisted when set
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,

    /// Write records to this JSON file instead of stdout (no database only)
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Runs the run command.
///
/// # Errors
/// Returns an error if configuration, the event source or the database cannot
/// be opened, or if the run aborts on a configuration problem.
pub async fn run_batch(args: RunArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let as_of = parse_date(args.as_of.as_deref())?;

    let mut universe = parse_tickers(args.tickers.as_deref());
    if universe.is_empty() {
        universe.clone_from(&config.scheduler.universe);
    }

    let database = match args.db_url.as_deref() {
        Some(url) => Some(connect(&config, Some(url)).await?),
        None => None,
    };
    let events = open_events(&config, args.events.as_deref(), database.as_ref()).await?;

    let memory = Arc::new(InMemoryRecordStore::new());
    let store: Arc<dyn RecordStore> = match &database {
        Some(db) => Arc::new(db.records()),
        None => memory.clone(),
    };

    let runner = BatchRunner::from_config(&config, events, store)?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, finishing started tickers and skipping the rest");
            let _ = cancel_tx.send(true);
        }
    });

    let summary = runner.run(as_of, universe, cancel_rx).await?;
    interrupt.abort();

    if database.is_some() {
        println!("{}", format_summary(&summary));
        return Ok(());
    }

    match &args.output {
        Some(path) => {
            let written = memory.export_json(path).await?;
            tracing::info!("Wrote {} records to {}", written, path);
            println!("{}", format_summary(&summary));
        }
        None => {
            eprintln!("{}", format_summary(&summary));
            println!("{}", serde_json::to_string_pretty(&memory.all().await)?);
        }
    }

    Ok(())
}
