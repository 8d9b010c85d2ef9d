//! Legislative trade disclosures.
//!
//! Each trade is weighted by its disclosed dollar bucket; net buy weight
//! against sell weight gives the direction.

use confluence_core::{AmountRange, CongressTrade, SignalSource, SourceScore, TradeSide};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::str::FromStr;

use super::{directional_score, Observations};

/// Net bucket weight that maps to a subscore of 50.
pub const HALF_SATURATION: f64 = 6.0;

/// Bucket midpoint ceilings (dollars) and their weights.
const BUCKETS: [(i64, f64); 7] = [
    (15_000, 1.0),
    (50_000, 2.0),
    (100_000, 3.0),
    (250_000, 4.0),
    (500_000, 5.0),
    (1_000_000, 6.0),
    (5_000_000, 7.0),
];

const TOP_BUCKET_WEIGHT: f64 = 8.0;

/// Weight of a trade by the midpoint of its disclosed amount bucket.
#[must_use]
pub fn amount_weight(range: &AmountRange) -> f64 {
    let mid = range.midpoint();
    BUCKETS
        .iter()
        .find(|(ceiling, _)| mid <= Decimal::from(*ceiling))
        .map_or(TOP_BUCKET_WEIGHT, |(_, w)| *w)
}

pub fn score(obs: &Observations<'_, CongressTrade>) -> SourceScore {
    let mut net = 0.0;
    let mut gross = 0.0;
    let mut buys = 0;
    let mut sells = 0;
    let mut members = BTreeSet::new();

    for (_, trade) in &obs.current {
        let weight = AmountRange::from_str(&trade.amount_range)
            .map(|r| amount_weight(&r))
            .unwrap_or(1.0);
        net += trade.transaction_type.signum() * weight;
        gross += weight;
        match trade.transaction_type {
            TradeSide::Buy => buys += 1,
            TradeSide::Sell => sells += 1,
        }
        members.insert(trade.trader.as_str());
    }

    let description = format!(
        "{buys} buy{} / {sells} sell{} by {} member{}",
        plural(buys),
        plural(sells),
        members.len(),
        plural(members.len()),
    );

    directional_score(
        SignalSource::Congress,
        net,
        gross,
        HALF_SATURATION,
        obs.current.len(),
        description,
        obs.latest_date(),
    )
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use crate::window::LookbackWindow;
    use chrono::NaiveDate;
    use confluence_core::{EventPayload, Sign, SignalEvent};
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn trade(trader: &str, side: TradeSide, range: &str, day: u32) -> SignalEvent {
        SignalEvent::new(
            "NVDA",
            date(3, day),
            EventPayload::Congress(CongressTrade {
                trader: trader.to_string(),
                chamber: "house".to_string(),
                party: None,
                transaction_type: side,
                amount_range: range.to_string(),
                transaction_date: date(3, day),
                disclosure_date: date(3, day),
            }),
        )
    }

    fn window() -> LookbackWindow {
        LookbackWindow::trailing(date(3, 31), 30)
    }

    #[test]
    fn bucket_weights_follow_midpoint() {
        let small = AmountRange {
            low: dec!(1001),
            high: Some(dec!(15000)),
        };
        let large = AmountRange {
            low: dec!(1000001),
            high: Some(dec!(5000000)),
        };
        let open = AmountRange {
            low: dec!(50000000),
            high: None,
        };
        assert!((amount_weight(&small) - 1.0).abs() < f64::EPSILON);
        assert!((amount_weight(&large) - 7.0).abs() < f64::EPSILON);
        assert!((amount_weight(&open) - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn net_buying_is_bullish() {
        let events = vec![
            trade("Pelosi", TradeSide::Buy, "$1,000,001 - $5,000,000", 10),
            trade("Tuberville", TradeSide::Buy, "$15,001 - $50,000", 12),
            trade("Crenshaw", TradeSide::Sell, "$1,001 - $15,000", 14),
        ];

        let score = normalize(SignalSource::Congress, &events, &window());

        assert_eq!(score.sign, Sign::Bullish);
        assert_eq!(score.event_count, 3);
        assert_eq!(score.latest_event, Some(date(3, 14)));
        // net = 7 + 2 - 1 = 8 -> 100 * 8 / 14
        assert!((score.subscore - 100.0 * 8.0 / 14.0).abs() < 1e-9);
        assert_eq!(score.description.as_deref(), Some("2 buys / 1 sell by 3 members"));
    }

    #[test]
    fn larger_trades_score_higher() {
        let small = vec![trade("A", TradeSide::Sell, "$1,001 - $15,000", 10)];
        let large = vec![trade("A", TradeSide::Sell, "$500,001 - $1,000,000", 10)];

        let s = normalize(SignalSource::Congress, &small, &window());
        let l = normalize(SignalSource::Congress, &large, &window());

        assert_eq!(s.sign, Sign::Bearish);
        assert_eq!(l.sign, Sign::Bearish);
        assert!(l.subscore > s.subscore);
    }

    #[test]
    fn offsetting_trades_are_neutral() {
        let events = vec![
            trade("A", TradeSide::Buy, "$15,001 - $50,000", 10),
            trade("B", TradeSide::Sell, "$15,001 - $50,000", 11),
        ];

        let score = normalize(SignalSource::Congress, &events, &window());

        assert_eq!(score.sign, Sign::Neutral);
        assert!(score.subscore > 0.0);
        assert!(!score.participates());
    }
}
