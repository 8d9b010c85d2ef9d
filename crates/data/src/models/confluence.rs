//! Row model for the `confluence_scores` table.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use confluence_core::{ConfluenceRecord, Direction, SignalDetail, SignalSource};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// One persisted confluence record.
///
/// Per-source subscores are stored as columns so they can be filtered in SQL;
/// details are stored as JSONB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConfluenceScoreRow {
    pub ticker: String,
    pub signal_date: NaiveDate,
    pub score: f64,
    /// "bullish", "bearish", "mixed" or "neutral"
    pub direction: String,
    pub source_count: i32,
    pub congress_score: f64,
    pub ark_score: f64,
    pub darkpool_score: f64,
    pub institutional_score: f64,
    pub insider_score: f64,
    pub short_interest_score: f64,
    pub superinvestor_score: f64,
    pub details: JsonValue,
    pub computed_at: DateTime<Utc>,
}

impl ConfluenceScoreRow {
    /// Converts a record into its row form.
    ///
    /// # Errors
    /// Returns an error if details cannot be serialized.
    pub fn from_record(record: &ConfluenceRecord) -> Result<Self> {
        Ok(Self {
            ticker: record.ticker.clone(),
            signal_date: record.signal_date,
            score: record.score,
            direction: record.direction.as_str().to_string(),
            source_count: i32::try_from(record.source_count)?,
            congress_score: record.score_for(SignalSource::Congress),
            ark_score: record.score_for(SignalSource::Ark),
            darkpool_score: record.score_for(SignalSource::DarkPool),
            institutional_score: record.score_for(SignalSource::Institutional),
            insider_score: record.score_for(SignalSource::Insider),
            short_interest_score: record.score_for(SignalSource::ShortInterest),
            superinvestor_score: record.score_for(SignalSource::Superinvestor),
            details: serde_json::to_value(&record.details)?,
            computed_at: record.computed_at,
        })
    }

    /// Converts the row back into a record.
    ///
    /// # Errors
    /// Returns an error for an unknown direction, negative count or
    /// unparseable details.
    pub fn into_record(self) -> Result<ConfluenceRecord> {
        let direction = Direction::parse(&self.direction)
            .ok_or_else(|| anyhow!("unknown direction '{}' for {}", self.direction, self.ticker))?;
        let details: Vec<SignalDetail> = serde_json::from_value(self.details)
            .with_context(|| format!("invalid details for {} @ {}", self.ticker, self.signal_date))?;

        let source_scores = BTreeMap::from([
            (SignalSource::Congress, self.congress_score),
            (SignalSource::Ark, self.ark_score),
            (SignalSource::DarkPool, self.darkpool_score),
            (SignalSource::Institutional, self.institutional_score),
            (SignalSource::Insider, self.insider_score),
            (SignalSource::ShortInterest, self.short_interest_score),
            (SignalSource::Superinvestor, self.superinvestor_score),
        ]);

        Ok(ConfluenceRecord {
            ticker: self.ticker,
            score: self.score,
            direction,
            source_count: usize::try_from(self.source_count)?,
            source_scores,
            details,
            signal_date: self.signal_date,
            computed_at: self.computed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn row_conversion_preserves_record() {
        let record = ConfluenceRecord {
            ticker: "GME".to_string(),
            score: 58.31,
            direction: Direction::Bearish,
            source_count: 2,
            source_scores: SignalSource::ALL
                .into_iter()
                .map(|s| match s {
                    SignalSource::ShortInterest => (s, 55.0),
                    SignalSource::Superinvestor => (s, 40.0),
                    _ => (s, 0.0),
                })
                .collect(),
            details: vec![SignalDetail {
                source: SignalSource::ShortInterest,
                description: "short interest up 3.00pp".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 6, 13).unwrap(),
            }],
            signal_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            computed_at: Utc.with_ymd_and_hms(2025, 6, 30, 22, 30, 0).unwrap(),
        };

        let row = ConfluenceScoreRow::from_record(&record).unwrap();
        assert_eq!(row.direction, "bearish");
        assert!((row.short_interest_score - 55.0).abs() < f64::EPSILON);

        assert_eq!(row.into_record().unwrap(), record);
    }

    #[test]
    fn unknown_direction_is_rejected() {
        let row = ConfluenceScoreRow {
            ticker: "X".to_string(),
            signal_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            score: 0.0,
            direction: "sideways".to_string(),
            source_count: 0,
            congress_score: 0.0,
            ark_score: 0.0,
            darkpool_score: 0.0,
            institutional_score: 0.0,
            insider_score: 0.0,
            short_interest_score: 0.0,
            superinvestor_score: 0.0,
            details: JsonValue::Array(vec![]),
            computed_at: Utc::now(),
        };

        assert!(row.into_record().is_err());
    }
}
