use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use confluence_core::{AppConfig, ConfluenceError, ConfluenceRecord, SchedulerConfig};
use confluence_data::{normalize_ticker, EventSource, RecordStore};
use confluence_signals::ConfluenceEngine;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Pool size and retry policy for one runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerSettings {
    pub max_concurrency: usize,
    pub persist_retries: u32,
    pub retry_base_delay: Duration,
}

impl From<&SchedulerConfig> for RunnerSettings {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
            persist_retries: config.persist_retries,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub as_of: Option<NaiveDate>,
    pub computed_at: Option<DateTime<Utc>>,
    /// Tickers whose record was written.
    pub succeeded: Vec<String>,
    /// Tickers that failed, with the reason.
    pub failed: BTreeMap<String, String>,
    /// Tickers not started because the run was cancelled.
    pub skipped: Vec<String>,
    /// Tickers whose event source was unavailable (scored with no events).
    pub unavailable: Vec<String>,
    /// Malformed events dropped across all tickers.
    pub dropped_events: usize,
}

impl RunSummary {
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.skipped.len()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

enum TickerOutcome {
    Written {
        ticker: String,
        dropped: usize,
        unavailable: bool,
    },
    Failed {
        ticker: String,
        reason: String,
    },
    Skipped(String),
}

struct Shared {
    engine: Arc<ConfluenceEngine>,
    events: Arc<dyn EventSource>,
    store: Arc<dyn RecordStore>,
    settings: RunnerSettings,
}

/// Computes and persists records for a universe of tickers.
///
/// Each ticker runs in its own task; a failure or panic in one ticker is
/// recorded in the summary and never affects the others.
#[derive(Clone)]
pub struct BatchRunner {
    shared: Arc<Shared>,
}

impl BatchRunner {
    #[must_use]
    pub fn new(
        engine: Arc<ConfluenceEngine>,
        events: Arc<dyn EventSource>,
        store: Arc<dyn RecordStore>,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                engine,
                events,
                store,
                settings,
            }),
        }
    }

    /// Builds a runner from a configuration snapshot.
    ///
    /// # Errors
    /// Returns a configuration error if the weight table or engine settings
    /// are invalid.
    pub fn from_config(
        config: &AppConfig,
        events: Arc<dyn EventSource>,
        store: Arc<dyn RecordStore>,
    ) -> Result<Self, ConfluenceError> {
        let engine = ConfluenceEngine::from_config(config)?;
        Ok(Self::new(
            Arc::new(engine),
            events,
            store,
            RunnerSettings::from(&config.scheduler),
        ))
    }

    #[must_use]
    pub fn engine(&self) -> &ConfluenceEngine {
        &self.shared.engine
    }

    /// Runs one batch stamped with the current time.
    ///
    /// # Errors
    /// Returns an error only for configuration problems, before any ticker
    /// is computed.
    pub async fn run(
        &self,
        as_of: NaiveDate,
        universe: Vec<String>,
        cancel: watch::Receiver<bool>,
    ) -> Result<RunSummary> {
        self.run_at(as_of, universe, cancel, Utc::now()).await
    }

    /// Runs one batch with an explicit `computed_at` shared by every record.
    ///
    /// An empty universe means every ticker the event source knows.
    ///
    /// # Errors
    /// Returns an error only for configuration problems, before any ticker
    /// is computed.
    pub async fn run_at(
        &self,
        as_of: NaiveDate,
        universe: Vec<String>,
        cancel: watch::Receiver<bool>,
        computed_at: DateTime<Utc>,
    ) -> Result<RunSummary> {
        let engine = &self.shared.engine;
        engine
            .weights()
            .ensure_complete(&engine.config().weight_context)
            .context("Weight table check failed; run aborted")?;

        let universe = if universe.is_empty() {
            self.shared
                .events
                .tickers()
                .await
                .context("Failed to list tickers from event source")?
        } else {
            universe
        };
        let universe: Vec<String> = universe
            .iter()
            .map(|t| normalize_ticker(t))
            .filter(|t| !t.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        info!(
            %as_of,
            tickers = universe.len(),
            weights_version = %engine.weights().version,
            concurrency = self.shared.settings.max_concurrency,
            "Starting confluence run"
        );

        let outcomes: Vec<TickerOutcome> = stream::iter(universe)
            .map(|ticker| {
                let shared = Arc::clone(&self.shared);
                let cancel = cancel.clone();
                async move {
                    if *cancel.borrow() {
                        return TickerOutcome::Skipped(ticker);
                    }
                    let task_ticker = ticker.clone();
                    let handle = tokio::spawn(async move {
                        process_ticker(&shared, &task_ticker, as_of, computed_at).await
                    });
                    match handle.await {
                        Ok(outcome) => outcome,
                        Err(e) => TickerOutcome::Failed {
                            reason: if e.is_panic() {
                                "task panicked".to_string()
                            } else {
                                format!("task aborted: {e}")
                            },
                            ticker,
                        },
                    }
                }
            })
            .buffer_unordered(self.shared.settings.max_concurrency.max(1))
            .collect()
            .await;

        let summary = summarize(as_of, computed_at, outcomes);

        info!(
            %as_of,
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            skipped = summary.skipped.len(),
            dropped_events = summary.dropped_events,
            "Confluence run complete"
        );

        Ok(summary)
    }
}

async fn process_ticker(
    shared: &Shared,
    ticker: &str,
    as_of: NaiveDate,
    computed_at: DateTime<Utc>,
) -> TickerOutcome {
    let since = shared.engine.history_start(as_of);
    let (events, unavailable) = match shared.events.events_for(ticker, since, as_of).await {
        Ok(events) => (events, false),
        Err(e) => {
            warn!(ticker, "Event source unavailable, scoring without events: {}", e);
            (Vec::new(), true)
        }
    };

    let computed = match shared.engine.compute(ticker, as_of, &events, computed_at) {
        Ok(computed) => computed,
        Err(e) => {
            error!(ticker, "Scoring failed: {}", e);
            return TickerOutcome::Failed {
                ticker: ticker.to_string(),
                reason: e.to_string(),
            };
        }
    };

    debug!(
        ticker,
        score = computed.record.score,
        direction = %computed.record.direction,
        sources = computed.record.source_count,
        "Computed record"
    );

    match persist_with_retry(shared, &computed.record).await {
        Ok(()) => TickerOutcome::Written {
            ticker: ticker.to_string(),
            dropped: computed.dropped_events(),
            unavailable,
        },
        Err(e) => {
            error!(ticker, "{}", e);
            TickerOutcome::Failed {
                ticker: ticker.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

async fn persist_with_retry(shared: &Shared, record: &ConfluenceRecord) -> Result<(), ConfluenceError> {
    let settings = shared.settings;
    let attempts = settings.persist_retries + 1;
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match shared.store.upsert(record).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                last_error = format!("{e:#}");
                if attempt < attempts {
                    let delay = settings
                        .retry_base_delay
                        .saturating_mul(2u32.saturating_pow(attempt - 1));
                    warn!(
                        ticker = %record.ticker,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Persist failed, retrying: {}",
                        last_error
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(ConfluenceError::PersistenceWrite {
        ticker: record.ticker.clone(),
        signal_date: record.signal_date,
        attempts,
        message: last_error,
    })
}

fn summarize(as_of: NaiveDate, computed_at: DateTime<Utc>, outcomes: Vec<TickerOutcome>) -> RunSummary {
    let mut summary = RunSummary {
        as_of: Some(as_of),
        computed_at: Some(computed_at),
        ..RunSummary::default()
    };

    for outcome in outcomes {
        match outcome {
            TickerOutcome::Written {
                ticker,
                dropped,
                unavailable,
            } => {
                summary.dropped_events += dropped;
                if unavailable {
                    summary.unavailable.push(ticker.clone());
                }
                summary.succeeded.push(ticker);
            }
            TickerOutcome::Failed { ticker, reason } => {
                summary.failed.insert(ticker, reason);
            }
            TickerOutcome::Skipped(ticker) => summary.skipped.push(ticker),
        }
    }

    summary.succeeded.sort();
    summary.skipped.sort();
    summary.unavailable.sort();
    summary
}
