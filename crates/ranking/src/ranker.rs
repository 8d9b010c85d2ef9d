use anyhow::Result;
use chrono::NaiveDate;
use confluence_core::ConfluenceRecord;
use confluence_data::RecordStore;
use std::sync::Arc;
use tracing::info;

use crate::query::{rank, RecordQuery};

/// Lookup outcome for a single ticker.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerStatus {
    /// The latest record for the ticker.
    Scored(Box<ConfluenceRecord>),
    /// No record has ever been written for the ticker.
    NoData { ticker: String },
}

impl TickerStatus {
    #[must_use]
    pub fn record(&self) -> Option<&ConfluenceRecord> {
        match self {
            Self::Scored(record) => Some(&**record),
            Self::NoData { .. } => None,
        }
    }
}

/// Read-only ranked views over a record store.
pub struct Ranker<S: RecordStore + ?Sized> {
    store: Arc<S>,
}

impl<S: RecordStore + ?Sized> Ranker<S> {
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Latest record per ticker, filtered and ranked.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub async fn top(&self, query: &RecordQuery) -> Result<Vec<ConfluenceRecord>> {
        let latest = self.store.latest_all().await?;
        let total = latest.len();
        let ranked = rank(latest, query);

        info!(
            "Ranking complete: {} of {} tickers match",
            ranked.len(),
            total
        );

        Ok(ranked)
    }

    /// Dated records for one ticker, oldest first.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub async fn history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ConfluenceRecord>> {
        let mut records = self.store.history(ticker, start, end).await?;
        records.sort_by_key(|r| r.signal_date);
        Ok(records)
    }

    /// Latest record for one ticker, or `NoData`.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub async fn lookup(&self, ticker: &str) -> Result<TickerStatus> {
        Ok(match self.store.latest(ticker).await? {
            Some(record) => TickerStatus::Scored(Box::new(record)),
            None => TickerStatus::NoData {
                ticker: ticker.trim().to_uppercase(),
            },
        })
    }
}
