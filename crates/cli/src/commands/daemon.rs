//! Scheduled runs with hot-reloaded configuration.

use anyhow::Result;
use clap::Args;
use confluence_core::ConfigWatcher;
use confluence_data::RecordStore;
use confluence_scheduler::ConfluenceScheduler;
use std::sync::Arc;
use tokio::sync::watch;

use super::{connect, load_config, open_events};

/// Arguments for the daemon command.
#[derive(Args, Debug, Clone)]
pub struct DaemonArgs {
    /// Config file path (watched for changes)
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,

    /// Events file (JSON array or JSON lines); defaults to the database
    #[arg(long)]
    pub events: Option<String>,

    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,
}

/// Runs the daemon command until SIGINT or SIGTERM.
///
/// # Errors
/// Returns an error if configuration or the database cannot be opened, or if
/// the scheduler fails to start.
pub async fn run_daemon(args: DaemonArgs) -> Result<()> {
    tracing::info!("Starting confluence daemon with config: {}", args.config);

    let config = load_config(&args.config)?;
    let database = connect(&config, args.db_url.as_deref()).await?;
    let events = open_events(&config, args.events.as_deref(), Some(&database)).await?;
    let store: Arc<dyn RecordStore> = Arc::new(database.records());

    let (watcher, config_rx) = ConfigWatcher::new(config);
    let config_path = args.config.clone();
    let watch_handle = tokio::spawn(async move {
        if let Err(e) = watcher.watch(&config_path).await {
            tracing::error!("Config watcher stopped: {:#}", e);
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = ConfluenceScheduler::new(config_rx, events, store);
    let scheduler_handle = tokio::spawn(scheduler.start(shutdown_rx));

    shutdown_signal().await?;
    let _ = shutdown_tx.send(true);

    match scheduler_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Scheduler error: {:#}", e),
        Err(e) => tracing::error!("Scheduler task failed: {}", e),
    }
    watch_handle.abort();

    tracing::info!("Confluence daemon stopped");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        }
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
    Ok(())
}
