//! Raw signal event repository.
//!
//! Upstream collectors write one row per observation; the scoring run reads
//! them back per ticker and date range.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use confluence_core::{ConfluenceError, ConfluenceResult, SignalEvent};
use sqlx::PgPool;
use tracing::warn;

use crate::models::SignalEventRow;
use crate::store::{normalize_ticker, EventSource};

/// Repository for the `signal_events` table.
#[derive(Debug, Clone)]
pub struct SignalEventRepository {
    pool: PgPool,
}

impl SignalEventRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn query_rows(
        &self,
        ticker: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<SignalEventRow>> {
        let rows = sqlx::query_as::<_, SignalEventRow>(
            r"
            SELECT id, ticker, event_date, source, payload, created_at
            FROM signal_events
            WHERE ticker = $1 AND event_date >= $2 AND event_date <= $3
            ORDER BY event_date ASC, id ASC
            ",
        )
        .bind(normalize_ticker(ticker))
        .bind(since)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl EventSource for SignalEventRepository {
    async fn events_for(
        &self,
        ticker: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> ConfluenceResult<Vec<SignalEvent>> {
        let rows = self
            .query_rows(ticker, since, until)
            .await
            .map_err(|e| ConfluenceError::SourceUnavailable {
                ticker: ticker.to_string(),
                reason: format!("{e:#}"),
            })?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            match row.into_event() {
                Ok(event) => events.push(event),
                Err(e) => warn!(ticker, ?id, "Skipping undecodable event row: {:#}", e),
            }
        }
        Ok(events)
    }

    async fn tickers(&self) -> ConfluenceResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT ticker FROM signal_events ORDER BY ticker ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| ConfluenceError::SourceUnavailable {
                    ticker: "*".to_string(),
                    reason: e.to_string(),
                })?;

        Ok(rows.into_iter().map(|(t,)| t).collect())
    }
}
