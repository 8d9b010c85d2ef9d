//! In-process record store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use confluence_core::ConfluenceRecord;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::store::{normalize_ticker, RecordStore};

type Key = (String, NaiveDate);

/// Record store backed by a `BTreeMap` behind a `tokio` `RwLock`.
///
/// Each entry is a fully built `Arc<ConfluenceRecord>` swapped in under the
/// write lock.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<BTreeMap<Key, Arc<ConfluenceRecord>>>>,
}

impl InMemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from existing records; later duplicates win.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = ConfluenceRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|r| ((normalize_ticker(&r.ticker), r.signal_date), Arc::new(r)))
            .collect();
        Self {
            records: Arc::new(RwLock::new(map)),
        }
    }

    /// Loads records from a JSON array file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read records from {}", path.display()))?;
        let records: Vec<ConfluenceRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse records in {}", path.display()))?;
        Ok(Self::from_records(records))
    }

    /// Writes all records to a JSON array file, ordered by ticker then date.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub async fn export_json(&self, path: impl AsRef<Path>) -> Result<usize> {
        let records = self.all().await;
        let json = serde_json::to_string_pretty(&records)?;
        tokio::fs::write(path.as_ref(), json)
            .await
            .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
        Ok(records.len())
    }

    /// Every stored record, ordered by ticker then date.
    pub async fn all(&self) -> Vec<ConfluenceRecord> {
        self.records
            .read()
            .await
            .values()
            .map(|r| ConfluenceRecord::clone(r))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn upsert(&self, record: &ConfluenceRecord) -> Result<()> {
        let key = (normalize_ticker(&record.ticker), record.signal_date);
        let built = Arc::new(record.clone());
        self.records.write().await.insert(key, built);
        Ok(())
    }

    async fn get(&self, ticker: &str, signal_date: NaiveDate) -> Result<Option<ConfluenceRecord>> {
        let key = (normalize_ticker(ticker), signal_date);
        Ok(self.records.read().await.get(&key).map(|r| ConfluenceRecord::clone(r)))
    }

    async fn latest(&self, ticker: &str) -> Result<Option<ConfluenceRecord>> {
        let ticker = normalize_ticker(ticker);
        let records = self.records.read().await;
        Ok(records
            .range((ticker.clone(), NaiveDate::MIN)..=(ticker, NaiveDate::MAX))
            .next_back()
            .map(|(_, r)| ConfluenceRecord::clone(r)))
    }

    async fn latest_all(&self) -> Result<Vec<ConfluenceRecord>> {
        let records = self.records.read().await;
        let mut latest: BTreeMap<&str, &Arc<ConfluenceRecord>> = BTreeMap::new();
        for ((ticker, _), record) in records.iter() {
            // Keys iterate in date order per ticker, so the last write wins.
            latest.insert(ticker.as_str(), record);
        }
        Ok(latest.into_values().map(|r| ConfluenceRecord::clone(r)).collect())
    }

    async fn history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ConfluenceRecord>> {
        if start > end {
            return Ok(Vec::new());
        }
        let ticker = normalize_ticker(ticker);
        let records = self.records.read().await;
        Ok(records
            .range((ticker.clone(), start)..=(ticker, end))
            .map(|(_, r)| ConfluenceRecord::clone(r))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use confluence_core::{Direction, SignalSource};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn record(ticker: &str, day: u32, score: f64) -> ConfluenceRecord {
        ConfluenceRecord {
            ticker: ticker.to_string(),
            score,
            direction: Direction::Bullish,
            source_count: 1,
            source_scores: SignalSource::ALL
                .into_iter()
                .map(|s| (s, if s == SignalSource::Congress { score } else { 0.0 }))
                .collect(),
            details: Vec::new(),
            signal_date: date(day),
            computed_at: Utc.with_ymd_and_hms(2025, 6, day, 22, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn upsert_replaces_same_key() {
        let store = InMemoryRecordStore::new();
        store.upsert(&record("NVDA", 10, 40.0)).await.unwrap();
        store.upsert(&record("NVDA", 10, 55.0)).await.unwrap();

        assert_eq!(store.len().await, 1);
        let stored = store.get("nvda", date(10)).await.unwrap().unwrap();
        assert!((stored.score - 55.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn latest_picks_most_recent_date() {
        let store = InMemoryRecordStore::new();
        store.upsert(&record("NVDA", 12, 30.0)).await.unwrap();
        store.upsert(&record("NVDA", 10, 40.0)).await.unwrap();
        store.upsert(&record("AMD", 11, 20.0)).await.unwrap();

        let latest = store.latest("NVDA").await.unwrap().unwrap();
        assert_eq!(latest.signal_date, date(12));

        let all = store.latest_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].ticker, "AMD");
        assert_eq!(all[1].signal_date, date(12));

        assert!(store.latest("TSLA").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn history_is_inclusive_and_ordered() {
        let store = InMemoryRecordStore::new();
        for day in [14, 10, 12, 16] {
            store.upsert(&record("NVDA", day, f64::from(day))).await.unwrap();
        }
        store.upsert(&record("NVDAX", 13, 1.0)).await.unwrap();

        let history = store.history("NVDA", date(10), date(14)).await.unwrap();
        let dates: Vec<_> = history.iter().map(|r| r.signal_date).collect();
        assert_eq!(dates, vec![date(10), date(12), date(14)]);

        assert!(store.history("NVDA", date(14), date(10)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn json_export_and_load_preserve_records() {
        let store = InMemoryRecordStore::new();
        store.upsert(&record("NVDA", 10, 40.25)).await.unwrap();
        store.upsert(&record("AMD", 10, 12.5)).await.unwrap();

        let file = tempfile::NamedTempFile::new().unwrap();
        let written = store.export_json(file.path()).await.unwrap();
        assert_eq!(written, 2);

        let loaded = InMemoryRecordStore::load_json(file.path()).await.unwrap();
        assert_eq!(loaded.all().await, store.all().await);
    }
}
