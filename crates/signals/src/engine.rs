//! Record builder: normalize, aggregate, resolve, assemble.

use chrono::{DateTime, NaiveDate, Utc};
use confluence_core::{
    AppConfig, ConfluenceRecord, ConfluenceResult, EngineConfig, SignalDetail, SignalEvent,
    SignalSource, SourceWeightTable, MAX_LOOKBACK_DAYS,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::aggregator::{Aggregate, ConfluenceAggregator};
use crate::direction::resolve_direction;
use crate::normalizer::{normalize_all, NormalizedSources};
use crate::window::LookbackWindow;

/// Smallest value a participating source shows after rounding.
const MIN_VISIBLE_SUBSCORE: f64 = 0.01;

/// A built record with the intermediate results that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedRecord {
    pub record: ConfluenceRecord,
    pub aggregate: Aggregate,
    pub normalized: NormalizedSources,
}

impl ComputedRecord {
    /// Events dropped as malformed while normalizing.
    #[must_use]
    pub fn dropped_events(&self) -> usize {
        self.normalized.dropped_events
    }
}

/// Computes confluence records for one weight table and engine configuration.
///
/// Holds no mutable state; share it across tasks behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ConfluenceEngine {
    config: EngineConfig,
    weights: Arc<SourceWeightTable>,
    aggregator: ConfluenceAggregator,
}

impl ConfluenceEngine {
    #[must_use]
    pub fn new(weights: Arc<SourceWeightTable>, config: EngineConfig) -> Self {
        let aggregator =
            ConfluenceAggregator::new(Arc::clone(&weights), config.weight_context.clone(), config.params);
        Self {
            config,
            weights,
            aggregator,
        }
    }

    /// Builds an engine from application config, checking the weight table
    /// covers every source in the configured context.
    ///
    /// # Errors
    /// Returns a configuration error if the table or engine config is invalid.
    pub fn from_config(config: &AppConfig) -> ConfluenceResult<Self> {
        config.engine.validate()?;
        config.weights.ensure_complete(&config.engine.weight_context)?;
        Ok(Self::new(Arc::new(config.weights.clone()), config.engine.clone()))
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn weights(&self) -> &SourceWeightTable {
        &self.weights
    }

    /// Window for one source ending on `as_of`.
    #[must_use]
    pub fn window(&self, source: SignalSource, as_of: NaiveDate) -> LookbackWindow {
        LookbackWindow::trailing(as_of, self.config.lookback_for(source))
    }

    /// Earliest event date any source needs, including the baseline filing
    /// that precedes a window.
    #[must_use]
    pub fn history_start(&self, as_of: NaiveDate) -> NaiveDate {
        let days = self.config.max_lookback().clamp(1, MAX_LOOKBACK_DAYS) * 2;
        as_of
            .checked_sub_signed(chrono::Duration::days(days))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Normalizes every source for one ticker.
    #[must_use]
    pub fn normalize(&self, as_of: NaiveDate, events: &[SignalEvent]) -> NormalizedSources {
        normalize_all(events, |source| self.window(source, as_of))
    }

    /// Computes the record for one ticker and as-of date.
    ///
    /// Events for other tickers are ignored. Identical inputs, including
    /// `computed_at`, produce identical records.
    ///
    /// # Errors
    /// Returns a weight lookup error if a participating source is unweighted.
    pub fn compute(
        &self,
        ticker: &str,
        as_of: NaiveDate,
        events: &[SignalEvent],
        computed_at: DateTime<Utc>,
    ) -> ConfluenceResult<ComputedRecord> {
        let ticker = ticker.trim().to_uppercase();
        let own: Vec<SignalEvent> = events
            .iter()
            .filter(|e| e.ticker.trim().eq_ignore_ascii_case(&ticker))
            .cloned()
            .collect();
        if own.len() < events.len() {
            debug!(%ticker, ignored = events.len() - own.len(), "Ignoring events for other tickers");
        }

        let normalized = self.normalize(as_of, &own);
        for score in normalized.scores.values().filter(|s| s.event_count > 0) {
            debug!(
                %ticker,
                source = %score.source,
                subscore = score.subscore,
                sign = score.sign.as_i8(),
                events = score.event_count,
                "Normalized source"
            );
        }

        let aggregate = self.aggregator.aggregate(&ticker, &normalized.scores)?;
        let record = build_record(ticker, as_of, &normalized, &aggregate, self.config.params.mixed_threshold, computed_at);

        Ok(ComputedRecord {
            record,
            aggregate,
            normalized,
        })
    }
}

/// Assembles the output record from normalized scores and their aggregate.
#[must_use]
pub fn build_record(
    ticker: String,
    as_of: NaiveDate,
    normalized: &NormalizedSources,
    aggregate: &Aggregate,
    mixed_threshold: f64,
    computed_at: DateTime<Utc>,
) -> ConfluenceRecord {
    let direction = resolve_direction(
        aggregate.positive_weighted_sum,
        aggregate.negative_weighted_sum,
        mixed_threshold,
    );

    let mut source_scores = BTreeMap::new();
    let mut details = Vec::new();
    for source in SignalSource::ALL {
        let Some(score) = normalized.scores.get(&source).filter(|s| s.participates()) else {
            source_scores.insert(source, 0.0);
            continue;
        };

        source_scores.insert(source, round2(score.subscore).max(MIN_VISIBLE_SUBSCORE));
        details.push(SignalDetail {
            source,
            description: score
                .description
                .clone()
                .unwrap_or_else(|| format!("{} events", score.event_count)),
            date: score.latest_event.unwrap_or(as_of),
        });
    }

    ConfluenceRecord {
        ticker,
        score: round2(aggregate.composite_score),
        direction,
        source_count: aggregate.participating,
        source_scores,
        details,
        signal_date: as_of,
        computed_at,
    }
}

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use confluence_core::{Direction, EventPayload, ShortInterestReport, SuperinvestorHolding};
    use rust_decimal_macros::dec;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn computed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 22, 30, 0).unwrap()
    }

    fn engine() -> ConfluenceEngine {
        ConfluenceEngine::new(Arc::new(SourceWeightTable::standard()), EngineConfig::default())
    }

    fn short_interest(ticker: &str, day: u32) -> SignalEvent {
        SignalEvent::new(
            ticker,
            NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            EventPayload::ShortInterest(ShortInterestReport {
                short_interest: 12_000_000,
                change_pct: 25.0,
                days_to_cover: 3.0,
                pct_float: 15.0,
            }),
        )
    }

    #[test]
    fn empty_input_is_neutral_zero() {
        let computed = engine().compute("aapl", as_of(), &[], computed_at()).unwrap();
        let record = computed.record;

        assert_eq!(record.ticker, "AAPL");
        assert!(record.score.abs() < f64::EPSILON);
        assert_eq!(record.direction, Direction::Neutral);
        assert_eq!(record.source_count, 0);
        assert_eq!(record.source_scores.len(), SignalSource::ALL.len());
        assert!(record.details.is_empty());
    }

    #[test]
    fn record_carries_details_for_participants() {
        let events = vec![
            short_interest("GME", 13),
            SignalEvent::new(
                "GME",
                NaiveDate::from_ymd_opt(2025, 5, 15).unwrap(),
                EventPayload::Superinvestor(SuperinvestorHolding {
                    fund_name: "Scion".to_string(),
                    shares: 0,
                    value: dec!(0),
                    share_change: -100_000,
                }),
            ),
        ];

        let record = engine().compute("GME", as_of(), &events, computed_at()).unwrap().record;

        assert_eq!(record.direction, Direction::Bearish);
        assert_eq!(record.source_count, 2);
        assert_eq!(record.details.len(), 2);
        assert_eq!(record.details[0].source, SignalSource::ShortInterest);
        assert_eq!(record.details[1].source, SignalSource::Superinvestor);
        assert_eq!(record.details[1].date, NaiveDate::from_ymd_opt(2025, 5, 15).unwrap());
        assert_eq!(record.participating_sources().len(), record.source_count);
    }

    #[test]
    fn scores_are_rounded_to_cents() {
        let record = engine()
            .compute("GME", as_of(), &[short_interest("GME", 13)], computed_at())
            .unwrap()
            .record;

        let si = record.score_for(SignalSource::ShortInterest);
        assert!((si * 100.0 - (si * 100.0).round()).abs() < 1e-9);
        assert!((record.score * 100.0 - (record.score * 100.0).round()).abs() < 1e-9);
    }

    #[test]
    fn other_tickers_are_ignored() {
        let record = engine()
            .compute("AMC", as_of(), &[short_interest("GME", 13)], computed_at())
            .unwrap()
            .record;

        assert_eq!(record.source_count, 0);
    }

    #[test]
    fn huge_lookback_is_capped_instead_of_overflowing() {
        let config = EngineConfig {
            lookback_days: i64::MAX / 4,
            ..EngineConfig::default()
        };
        let engine = ConfluenceEngine::new(Arc::new(SourceWeightTable::standard()), config);

        let start = engine.history_start(as_of());
        assert_eq!(start, as_of() - chrono::Duration::days(2 * MAX_LOOKBACK_DAYS));

        let record = engine
            .compute("GME", as_of(), &[short_interest("GME", 13)], computed_at())
            .unwrap()
            .record;
        assert_eq!(record.source_count, 1);
    }

    #[test]
    fn incomplete_weights_fail_from_config() {
        let mut config = AppConfig::default();
        config.weights.base.remove(&SignalSource::Insider);

        assert!(ConfluenceEngine::from_config(&config).is_err());
    }

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert!((round2(12.345_6) - 12.35).abs() < 1e-12);
        assert!((round2(0.004) - 0.0).abs() < 1e-12);
    }
}
