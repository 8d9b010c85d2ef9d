//! File-backed and in-memory event sources.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use confluence_core::{ConfluenceError, ConfluenceResult, SignalEvent};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::store::{normalize_ticker, EventSource};

/// Events held in memory, indexed by ticker.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventSource {
    by_ticker: BTreeMap<String, Vec<SignalEvent>>,
    unavailable: BTreeSet<String>,
}

impl InMemoryEventSource {
    #[must_use]
    pub fn new(events: impl IntoIterator<Item = SignalEvent>) -> Self {
        let mut by_ticker: BTreeMap<String, Vec<SignalEvent>> = BTreeMap::new();
        for event in events {
            by_ticker
                .entry(normalize_ticker(&event.ticker))
                .or_default()
                .push(event);
        }
        Self {
            by_ticker,
            unavailable: BTreeSet::new(),
        }
    }

    /// Marks a ticker whose reads fail with `SourceUnavailable`.
    #[must_use]
    pub fn with_unavailable(mut self, ticker: &str) -> Self {
        self.unavailable.insert(normalize_ticker(ticker));
        self
    }

    /// Total number of events held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_ticker.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_ticker.is_empty()
    }
}

#[async_trait]
impl EventSource for InMemoryEventSource {
    async fn events_for(
        &self,
        ticker: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> ConfluenceResult<Vec<SignalEvent>> {
        let key = normalize_ticker(ticker);
        if self.unavailable.contains(&key) {
            return Err(ConfluenceError::SourceUnavailable {
                ticker: key,
                reason: "marked unavailable".to_string(),
            });
        }

        Ok(self
            .by_ticker
            .get(&key)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.event_date >= since && e.event_date <= until)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn tickers(&self) -> ConfluenceResult<Vec<String>> {
        Ok(self.by_ticker.keys().cloned().collect())
    }
}

/// Events loaded from a JSON file: either one JSON array of events or one
/// event object per line.
///
/// Entries that fail to decode are skipped with a warning.
#[derive(Debug, Clone)]
pub struct JsonEventSource {
    path: PathBuf,
    inner: InMemoryEventSource,
    skipped: usize,
}

impl JsonEventSource {
    /// Reads and indexes the file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, or if it looks like a JSON
    /// array but is not valid JSON.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read events from {}", path.display()))?;

        let (events, skipped) = parse_events(&raw)
            .with_context(|| format!("Failed to parse events in {}", path.display()))?;
        info!(path = %path.display(), events = events.len(), skipped, "Loaded events");

        Ok(Self {
            path,
            inner: InMemoryEventSource::new(events),
            skipped,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries that could not be decoded.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl EventSource for JsonEventSource {
    async fn events_for(
        &self,
        ticker: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> ConfluenceResult<Vec<SignalEvent>> {
        self.inner.events_for(ticker, since, until).await
    }

    async fn tickers(&self) -> ConfluenceResult<Vec<String>> {
        self.inner.tickers().await
    }
}

/// Decodes a JSON array or JSON-lines document into events.
///
/// Returns the decoded events and the number of skipped entries.
///
/// # Errors
/// Returns an error only when an array document is not valid JSON.
pub fn parse_events(raw: &str) -> Result<(Vec<SignalEvent>, usize)> {
    let values: Vec<(usize, JsonValue)> = if raw.trim_start().starts_with('[') {
        let array: Vec<JsonValue> = serde_json::from_str(raw)?;
        array.into_iter().enumerate().map(|(i, v)| (i + 1, v)).collect()
    } else {
        let mut values = Vec::new();
        for (i, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(value) => values.push((i + 1, value)),
                Err(e) => {
                    warn!(line = i + 1, "Skipping invalid JSON line: {}", e);
                    values.push((i + 1, JsonValue::Null));
                }
            }
        }
        values
    };

    let mut events = Vec::with_capacity(values.len());
    let mut skipped = 0;
    for (position, value) in values {
        if value.is_null() {
            skipped += 1;
            continue;
        }
        match serde_json::from_value::<SignalEvent>(value) {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!(position, "Skipping undecodable event: {}", e);
                skipped += 1;
            }
        }
    }

    Ok((events, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    const ARK_LINE: &str = r#"{"ticker":"coin","event_date":"2025-06-03","payload":{"source":"ark","fund":"ARKK","shares":1000,"weight_pct":0.5,"trade_type":"buy"}}"#;
    const SI_LINE: &str = r#"{"ticker":"GME","event_date":"2025-06-13","payload":{"source":"short_interest","short_interest":50000000,"change_pct":12.0,"days_to_cover":3.1,"pct_float":21.0}}"#;

    #[test]
    fn parses_json_lines_and_skips_garbage() {
        let raw = format!("{ARK_LINE}\n\nnot json\n{SI_LINE}\n{{\"ticker\":\"X\"}}\n");

        let (events, skipped) = parse_events(&raw).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(skipped, 2);
        assert_eq!(events[1].ticker, "GME");
    }

    #[test]
    fn parses_json_array() {
        let raw = format!("[{ARK_LINE},\n{SI_LINE}]");

        let (events, skipped) = parse_events(&raw).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(skipped, 0);
    }

    #[test]
    fn broken_array_is_an_error() {
        assert!(parse_events("[{").is_err());
    }

    #[tokio::test]
    async fn json_source_filters_by_ticker_and_range() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{ARK_LINE}").unwrap();
        writeln!(file, "{SI_LINE}").unwrap();

        let source = JsonEventSource::load(file.path()).await.unwrap();

        assert_eq!(source.len(), 2);
        assert_eq!(source.tickers().await.unwrap(), vec!["COIN", "GME"]);

        let coin = source.events_for("Coin", date(6, 1), date(6, 30)).await.unwrap();
        assert_eq!(coin.len(), 1);

        let outside = source.events_for("GME", date(6, 14), date(6, 30)).await.unwrap();
        assert!(outside.is_empty());
    }

    #[tokio::test]
    async fn unavailable_ticker_errors() {
        let source = InMemoryEventSource::default().with_unavailable("gme");

        let err = source.events_for("GME", date(6, 1), date(6, 30)).await.unwrap_err();

        assert!(matches!(err, ConfluenceError::SourceUnavailable { .. }));
    }
}
