//! Corporate insider transactions.
//!
//! Open-market purchases are a stronger tell than sales (sales happen for
//! many non-directional reasons), so sells carry half the weight of buys.
//! Clustered trades and trades by senior officers are weighted up.

use confluence_core::{InsiderTransaction, SignalSource, SourceScore, TradeSide};
use rust_decimal::prelude::ToPrimitive;

use super::{directional_score, Observations};
use crate::common::format_usd;

/// Net weighted dollar value that maps to a subscore of 50.
pub const HALF_SATURATION: f64 = 500_000.0;

pub const BUY_WEIGHT: f64 = 1.0;
pub const SELL_WEIGHT: f64 = 0.5;
pub const CLUSTER_MULTIPLIER: f64 = 2.0;
pub const SENIOR_OFFICER_MULTIPLIER: f64 = 1.25;

const SENIOR_TITLES: [&str; 5] = ["CEO", "CFO", "COO", "PRESIDENT", "CHAIR"];

/// Returns true for chief officers, presidents and board chairs.
#[must_use]
pub fn is_senior_officer(title: &str) -> bool {
    let upper = title.to_uppercase();
    upper.contains("CHIEF") || SENIOR_TITLES.iter().any(|t| upper.contains(t))
}

fn transaction_weight(tx: &InsiderTransaction) -> f64 {
    let mut weight = match tx.transaction_type {
        TradeSide::Buy => BUY_WEIGHT,
        TradeSide::Sell => SELL_WEIGHT,
    };
    if tx.is_cluster {
        weight *= CLUSTER_MULTIPLIER;
    }
    if is_senior_officer(&tx.title) {
        weight *= SENIOR_OFFICER_MULTIPLIER;
    }
    weight
}

pub fn score(obs: &Observations<'_, InsiderTransaction>) -> SourceScore {
    let mut net = 0.0;
    let mut gross = 0.0;
    let (mut bought, mut sold) = (0.0, 0.0);
    let (mut buys, mut sells) = (0usize, 0usize);
    let mut cluster = false;

    for (_, tx) in &obs.current {
        let value = tx.value.to_f64().unwrap_or(0.0);
        let weighted = transaction_weight(tx) * value;
        net += tx.transaction_type.signum() * weighted;
        gross += weighted;
        cluster |= tx.is_cluster;
        match tx.transaction_type {
            TradeSide::Buy => {
                buys += 1;
                bought += value;
            }
            TradeSide::Sell => {
                sells += 1;
                sold += value;
            }
        }
    }

    let mut description = format!(
        "{buys} buy{} ({}), {sells} sell{} ({})",
        if buys == 1 { "" } else { "s" },
        format_usd(bought, 0),
        if sells == 1 { "" } else { "s" },
        format_usd(sold, 0),
    );
    if cluster {
        description.push_str(", cluster");
    }

    directional_score(
        SignalSource::Insider,
        net,
        gross,
        HALF_SATURATION,
        obs.current.len(),
        description,
        obs.latest_date(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use crate::window::LookbackWindow;
    use chrono::NaiveDate;
    use confluence_core::{EventPayload, Sign, SignalEvent};
    use rust_decimal::Decimal;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn tx(title: &str, side: TradeSide, value: i64, cluster: bool, day: u32) -> SignalEvent {
        SignalEvent::new(
            "PLTR",
            date(day),
            EventPayload::Insider(InsiderTransaction {
                insider_name: "Jane Doe".to_string(),
                title: title.to_string(),
                transaction_type: side,
                shares: 10_000,
                value: Decimal::from(value),
                is_cluster: cluster,
            }),
        )
    }

    fn window() -> LookbackWindow {
        LookbackWindow::trailing(date(30), 30)
    }

    #[test]
    fn senior_titles_are_detected() {
        assert!(is_senior_officer("Chief Executive Officer"));
        assert!(is_senior_officer("CFO"));
        assert!(is_senior_officer("Chairman of the Board"));
        assert!(!is_senior_officer("Director"));
        assert!(!is_senior_officer("10% Owner"));
    }

    #[test]
    fn sells_weigh_half_of_buys() {
        let events = vec![
            tx("Director", TradeSide::Buy, 400_000, false, 5),
            tx("Director", TradeSide::Sell, 800_000, false, 6),
        ];

        let score = normalize(SignalSource::Insider, &events, &window());

        assert_eq!(score.sign, Sign::Neutral);
    }

    #[test]
    fn cluster_buying_by_officers_scores_high() {
        let plain = vec![tx("Director", TradeSide::Buy, 250_000, false, 5)];
        let boosted = vec![tx("CEO", TradeSide::Buy, 250_000, true, 5)];

        let p = normalize(SignalSource::Insider, &plain, &window());
        let b = normalize(SignalSource::Insider, &boosted, &window());

        assert_eq!(p.sign, Sign::Bullish);
        assert!((p.subscore - 100.0 / 3.0).abs() < 1e-9);
        // 250k * 2.0 * 1.25 = 625k
        assert!((b.subscore - 100.0 * 625.0 / 1125.0).abs() < 1e-9);
        assert_eq!(b.description.as_deref(), Some("1 buy ($250,000), 0 sells ($0), cluster"));
    }

    #[test]
    fn heavy_selling_is_bearish() {
        let events = vec![
            tx("CFO", TradeSide::Sell, 3_000_000, false, 10),
            tx("Director", TradeSide::Buy, 100_000, false, 12),
        ];

        let score = normalize(SignalSource::Insider, &events, &window());

        assert_eq!(score.sign, Sign::Bearish);
        assert_eq!(score.latest_event, Some(date(12)));
    }
}
