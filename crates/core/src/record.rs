//! The per-ticker, per-date confluence record and its JSON contract.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::source::SignalSource;

/// Resolved net directional call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    /// Comparable evidence on both sides.
    Mixed,
    /// No participating sources.
    Neutral,
}

impl Direction {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Mixed => "mixed",
            Self::Neutral => "neutral",
        }
    }

    /// Parses from string (non-failing version).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bullish" | "bull" | "up" => Some(Self::Bullish),
            "bearish" | "bear" | "down" => Some(Self::Bearish),
            "mixed" => Some(Self::Mixed),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| anyhow::anyhow!("Invalid direction: {}", s))
    }
}

/// Human-readable evidence line for one participating source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDetail {
    pub source: SignalSource,
    pub description: String,
    pub date: NaiveDate,
}

/// Final output unit for one ticker on one as-of date.
///
/// Serializes to the flat dashboard contract: one `<source>_score` field per
/// known source, 0 when the source did not participate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "RecordWire", from = "RecordWire")]
pub struct ConfluenceRecord {
    pub ticker: String,
    /// Composite conviction score in [0, 100].
    pub score: f64,
    pub direction: Direction,
    /// Number of sources with a nonzero sign.
    pub source_count: usize,
    /// Subscore per known source; every source is present.
    pub source_scores: BTreeMap<SignalSource, f64>,
    pub details: Vec<SignalDetail>,
    /// The as-of date this record represents.
    pub signal_date: NaiveDate,
    pub computed_at: DateTime<Utc>,
}

impl ConfluenceRecord {
    /// Returns the subscore for a source, 0 if it did not participate.
    #[must_use]
    pub fn score_for(&self, source: SignalSource) -> f64 {
        self.source_scores.get(&source).copied().unwrap_or(0.0)
    }

    /// Returns true if the source contributed a nonzero subscore.
    #[must_use]
    pub fn has_source(&self, source: SignalSource) -> bool {
        self.score_for(source) > 0.0
    }

    /// Returns the participating sources in canonical order.
    #[must_use]
    pub fn participating_sources(&self) -> Vec<SignalSource> {
        SignalSource::ALL
            .into_iter()
            .filter(|s| self.has_source(*s))
            .collect()
    }

    /// Returns the persistence key.
    #[must_use]
    pub fn key(&self) -> (String, NaiveDate) {
        (self.ticker.clone(), self.signal_date)
    }
}

/// Flat JSON shape of [`ConfluenceRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordWire {
    ticker: String,
    score: f64,
    direction: Direction,
    source_count: usize,
    #[serde(default)]
    congress_score: f64,
    #[serde(default)]
    ark_score: f64,
    #[serde(default)]
    darkpool_score: f64,
    #[serde(default)]
    institutional_score: f64,
    #[serde(default)]
    insider_score: f64,
    #[serde(default)]
    short_interest_score: f64,
    #[serde(default)]
    superinvestor_score: f64,
    #[serde(default)]
    details: Vec<SignalDetail>,
    signal_date: NaiveDate,
    computed_at: DateTime<Utc>,
}

impl From<ConfluenceRecord> for RecordWire {
    fn from(record: ConfluenceRecord) -> Self {
        Self {
            congress_score: record.score_for(SignalSource::Congress),
            ark_score: record.score_for(SignalSource::Ark),
            darkpool_score: record.score_for(SignalSource::DarkPool),
            institutional_score: record.score_for(SignalSource::Institutional),
            insider_score: record.score_for(SignalSource::Insider),
            short_interest_score: record.score_for(SignalSource::ShortInterest),
            superinvestor_score: record.score_for(SignalSource::Superinvestor),
            ticker: record.ticker,
            score: record.score,
            direction: record.direction,
            source_count: record.source_count,
            details: record.details,
            signal_date: record.signal_date,
            computed_at: record.computed_at,
        }
    }
}

impl From<RecordWire> for ConfluenceRecord {
    fn from(wire: RecordWire) -> Self {
        let source_scores = BTreeMap::from([
            (SignalSource::Congress, wire.congress_score),
            (SignalSource::Ark, wire.ark_score),
            (SignalSource::DarkPool, wire.darkpool_score),
            (SignalSource::Institutional, wire.institutional_score),
            (SignalSource::Insider, wire.insider_score),
            (SignalSource::ShortInterest, wire.short_interest_score),
            (SignalSource::Superinvestor, wire.superinvestor_score),
        ]);

        Self {
            ticker: wire.ticker,
            score: wire.score,
            direction: wire.direction,
            source_count: wire.source_count,
            source_scores,
            details: wire.details,
            signal_date: wire.signal_date,
            computed_at: wire.computed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> ConfluenceRecord {
        let mut source_scores: BTreeMap<SignalSource, f64> =
            SignalSource::ALL.into_iter().map(|s| (s, 0.0)).collect();
        source_scores.insert(SignalSource::ShortInterest, 40.0);
        source_scores.insert(SignalSource::Superinvestor, 57.14);

        ConfluenceRecord {
            ticker: "XYZ".to_string(),
            score: 61.73,
            direction: Direction::Bearish,
            source_count: 2,
            source_scores,
            details: vec![SignalDetail {
                source: SignalSource::ShortInterest,
                description: "Short interest up 1.3pp to 18.2% of float".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            }],
            signal_date: NaiveDate::from_ymd_opt(2025, 3, 17).unwrap(),
            computed_at: Utc.with_ymd_and_hms(2025, 3, 17, 22, 5, 0).unwrap(),
        }
    }

    #[test]
    fn serializes_flat_contract() {
        let json = serde_json::to_value(sample_record()).unwrap();

        assert_eq!(json["ticker"], "XYZ");
        assert_eq!(json["direction"], "bearish");
        assert_eq!(json["source_count"], 2);
        assert_eq!(json["short_interest_score"], 40.0);
        assert_eq!(json["congress_score"], 0.0);
        assert_eq!(json["signal_date"], "2025-03-17");
        assert_eq!(json["details"][0]["source"], "short_interest");
        assert_eq!(json["details"][0]["date"], "2025-03-14");
        assert!(json.get("source_scores").is_none());
    }

    #[test]
    fn json_round_trip_preserves_every_field() {
        let record = sample_record();
        let text = serde_json::to_string(&record).unwrap();
        let parsed: ConfluenceRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn missing_source_fields_default_to_zero() {
        let json = r#"{
            "ticker": "ABC", "score": 0.0, "direction": "neutral", "source_count": 0,
            "signal_date": "2025-01-02", "computed_at": "2025-01-02T21:00:00Z"
        }"#;
        let record: ConfluenceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.source_scores.len(), SignalSource::ALL.len());
        assert!(record.participating_sources().is_empty());
        assert!(record.details.is_empty());
    }

    #[test]
    fn participating_sources_in_canonical_order() {
        let record = sample_record();
        assert_eq!(
            record.participating_sources(),
            vec![SignalSource::ShortInterest, SignalSource::Superinvestor]
        );
        assert!(record.has_source(SignalSource::ShortInterest));
        assert!(!record.has_source(SignalSource::Insider));
    }

    #[test]
    fn direction_parses_aliases() {
        assert_eq!(Direction::parse("BULL"), Some(Direction::Bullish));
        assert_eq!(Direction::parse("mixed"), Some(Direction::Mixed));
        assert!("sideways".parse::<Direction>().is_err());
    }
}
