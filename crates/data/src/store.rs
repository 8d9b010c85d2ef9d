//! Storage seams for confluence records and raw signal events.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use confluence_core::{ConfluenceRecord, ConfluenceResult, SignalEvent};

/// Dated record storage keyed by (ticker, signal_date).
///
/// Writes are last-writer-wins and atomic per record: a reader sees either the
/// previous record or the new one, never a mix.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts or replaces the record for its (ticker, signal_date).
    async fn upsert(&self, record: &ConfluenceRecord) -> Result<()>;

    /// Record for one ticker on one date.
    async fn get(&self, ticker: &str, signal_date: NaiveDate) -> Result<Option<ConfluenceRecord>>;

    /// Most recent record for one ticker.
    async fn latest(&self, ticker: &str) -> Result<Option<ConfluenceRecord>>;

    /// Most recent record of every ticker.
    async fn latest_all(&self) -> Result<Vec<ConfluenceRecord>>;

    /// Records for one ticker with `start <= signal_date <= end`, oldest first.
    async fn history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ConfluenceRecord>>;
}

/// Supplier of raw events for one ticker.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Events for `ticker` dated in `[since, until]`.
    ///
    /// # Errors
    /// `SourceUnavailable` if the backing store cannot be read.
    async fn events_for(
        &self,
        ticker: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> ConfluenceResult<Vec<SignalEvent>>;

    /// Tickers with at least one event, sorted.
    async fn tickers(&self) -> ConfluenceResult<Vec<String>>;
}

/// Normalizes a ticker symbol for keys and lookups.
#[must_use]
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}
