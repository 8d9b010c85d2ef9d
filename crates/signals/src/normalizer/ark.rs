//! Active ETF daily trades.

use confluence_core::{EtfTrade, SignalSource, SourceScore, TradeSide};
use std::collections::BTreeSet;

use super::{directional_score, Observations};

/// Net portfolio weight (percentage points) that maps to a subscore of 50.
pub const HALF_SATURATION: f64 = 2.0;

pub fn score(obs: &Observations<'_, EtfTrade>) -> SourceScore {
    let mut net = 0.0;
    let mut gross = 0.0;
    let mut funds = BTreeSet::new();
    let (mut buys, mut sells) = (0usize, 0usize);

    for (_, trade) in &obs.current {
        net += trade.trade_type.signum() * trade.weight_pct;
        gross += trade.weight_pct;
        funds.insert(trade.fund.as_str());
        match trade.trade_type {
            TradeSide::Buy => buys += 1,
            TradeSide::Sell => sells += 1,
        }
    }

    let funds: Vec<&str> = funds.into_iter().collect();
    let description = format!(
        "{} bought {buys}x, sold {sells}x (net {net:+.2}% weight)",
        funds.join("/")
    );

    directional_score(
        SignalSource::Ark,
        net,
        gross,
        HALF_SATURATION,
        obs.current.len(),
        description,
        obs.latest_date(),
    )
}
