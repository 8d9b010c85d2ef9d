use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use confluence_core::AppConfig;
use confluence_data::{EventSource, RecordStore};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::runner::{BatchRunner, RunSummary};

/// Runs the confluence batch on a cron schedule.
///
/// Every run takes a fresh snapshot of the watched configuration, so weight
/// or schedule changes never affect a run that is already in flight.
pub struct ConfluenceScheduler {
    config: watch::Receiver<AppConfig>,
    events: Arc<dyn EventSource>,
    store: Arc<dyn RecordStore>,
}

impl ConfluenceScheduler {
    #[must_use]
    pub fn new(
        config: watch::Receiver<AppConfig>,
        events: Arc<dyn EventSource>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            config,
            events,
            store,
        }
    }

    /// Starts the scheduler and runs until `shutdown` flips to true.
    ///
    /// The same signal cancels a run in flight: tickers not yet started are
    /// reported as skipped.
    ///
    /// # Errors
    /// Returns an error if the cron expression is invalid or the scheduler
    /// fails to start.
    pub async fn start(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let initial = self.config.borrow().clone();
        if !initial.scheduler.enabled {
            info!("Confluence scheduler is disabled");
            return Ok(());
        }

        info!(
            "Starting confluence scheduler with cron: {}",
            initial.scheduler.cron_schedule
        );

        let mut scheduler = JobScheduler::new().await?;
        let config = self.config.clone();
        let events = Arc::clone(&self.events);
        let store = Arc::clone(&self.store);
        let cancel = shutdown.clone();

        let job = Job::new_async(initial.scheduler.cron_schedule.as_str(), move |_uuid, _lock| {
            let snapshot = config.borrow().clone();
            let events = Arc::clone(&events);
            let store = Arc::clone(&store);
            let cancel = cancel.clone();
            Box::pin(async move {
                let as_of = Utc::now().date_naive();
                match run_batch(&snapshot, events, store, as_of, cancel).await {
                    Ok(summary) if summary.is_clean() => {}
                    Ok(summary) => error!(
                        failed = summary.failed.len(),
                        skipped = summary.skipped.len(),
                        "Confluence run finished with failures"
                    ),
                    Err(e) => error!("Confluence run aborted: {:#}", e),
                }
            })
        })
        .context("Invalid cron schedule")?;

        scheduler.add(job).await?;
        scheduler.start().await?;

        info!("Confluence scheduler started successfully");

        while !*shutdown.borrow() {
            if shutdown.changed().await.is_err() {
                break;
            }
        }

        info!("Shutting down confluence scheduler");
        scheduler.shutdown().await?;
        Ok(())
    }

    /// Runs one batch immediately with the current configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub async fn run_once(&self, as_of: NaiveDate) -> Result<RunSummary> {
        let snapshot = self.config.borrow().clone();
        let (_cancel_tx, cancel) = watch::channel(false);
        run_batch(
            &snapshot,
            Arc::clone(&self.events),
            Arc::clone(&self.store),
            as_of,
            cancel,
        )
        .await
    }
}

async fn run_batch(
    config: &AppConfig,
    events: Arc<dyn EventSource>,
    store: Arc<dyn RecordStore>,
    as_of: NaiveDate,
    cancel: watch::Receiver<bool>,
) -> Result<RunSummary> {
    let runner = BatchRunner::from_config(config, events, store)
        .context("Invalid configuration; run aborted")?;
    runner
        .run(as_of, config.scheduler.universe.clone(), cancel)
        .await
}
