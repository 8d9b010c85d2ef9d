//! CLI commands for the confluence engine.

pub mod daemon;
pub mod history;
pub mod rank;
pub mod run;

pub use daemon::{run_daemon, DaemonArgs};
pub use history::{run_history, HistoryArgs};
pub use rank::{run_rank, RankArgs};
pub use run::{run_batch, RunArgs};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use confluence_core::{AppConfig, ConfigLoader};
use confluence_data::{DatabaseClient, EventSource, InMemoryRecordStore, JsonEventSource, RecordStore};
use std::sync::Arc;

/// Loads layered configuration from a TOML path.
pub(crate) fn load_config(path: &str) -> Result<AppConfig> {
    let config = ConfigLoader::load_from(path)?;
    tracing::info!(
        path,
        weights_version = %config.weights.version,
        context = %config.engine.weight_context,
        "Configuration loaded"
    );
    Ok(config)
}

/// Connects to Postgres, preferring an explicit URL over the configured one.
pub(crate) async fn connect(config: &AppConfig, db_url: Option<&str>) -> Result<DatabaseClient> {
    let mut database = config.database.clone();
    if let Some(url) = db_url {
        database.url = url.to_string();
    }
    let client = DatabaseClient::connect(&database).await?;
    client.ensure_schema().await?;
    tracing::info!("Connected to database");
    Ok(client)
}

/// Parses `YYYY-MM-DD`, defaulting to today.
pub(crate) fn parse_date(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{s}'. Use YYYY-MM-DD")),
        None => Ok(chrono::Utc::now().date_naive()),
    }
}

/// Splits a comma-separated ticker list.
pub(crate) fn parse_tickers(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_uppercase)
            .collect()
    })
    .unwrap_or_default()
}

/// Picks the event source: an explicit file, then the database, then the
/// configured events file.
pub(crate) async fn open_events(
    config: &AppConfig,
    events_path: Option<&str>,
    database: Option<&DatabaseClient>,
) -> Result<Arc<dyn EventSource>> {
    let configured = if database.is_none() {
        config.scheduler.events_path.as_deref()
    } else {
        None
    };
    if let Some(path) = events_path.or(configured) {
        let source = JsonEventSource::load(path).await?;
        tracing::info!(path, events = source.len(), skipped = source.skipped(), "Loaded events");
        return Ok(Arc::new(source));
    }

    database
        .map(|db| Arc::new(db.events()) as Arc<dyn EventSource>)
        .ok_or_else(|| anyhow!("No event source: pass --events, set scheduler.events_path, or provide a database URL"))
}

/// Opens a read-only record store: a JSON records file, or the database.
pub(crate) async fn open_records(
    config: &AppConfig,
    records_path: Option<&str>,
    db_url: Option<&str>,
) -> Result<Arc<dyn RecordStore>> {
    if let Some(path) = records_path {
        return Ok(Arc::new(InMemoryRecordStore::load_json(path).await?));
    }
    let client = connect(config, db_url).await?;
    Ok(Arc::new(client.records()))
}
