//! Concentrated-fund 13F positions.
//!
//! Each fund votes once, using its latest in-window holding: held or added
//! is a bullish vote, trimmed or exited is a bearish vote.

use confluence_core::{SignalSource, SourceScore, SuperinvestorHolding};
use std::collections::BTreeMap;

use super::{directional_score, Observations};

/// Net fund votes that map to a subscore of 50.
pub const HALF_SATURATION: f64 = 1.5;

fn vote(holding: &SuperinvestorHolding) -> f64 {
    if holding.shares == 0 || holding.share_change < 0 {
        -1.0
    } else {
        1.0
    }
}

pub fn score(obs: &Observations<'_, SuperinvestorHolding>) -> SourceScore {
    let latest: BTreeMap<&str, &SuperinvestorHolding> = obs
        .current
        .iter()
        .map(|(_, h)| (h.fund_name.as_str(), *h))
        .collect();

    let mut net = 0.0;
    let mut long = Vec::new();
    let mut short = 0usize;
    for (fund, holding) in &latest {
        let v = vote(holding);
        net += v;
        if v > 0.0 {
            long.push(*fund);
        } else {
            short += 1;
        }
    }

    let description = if long.is_empty() {
        format!("{short} fund(s) trimmed or exited")
    } else {
        format!(
            "held/added by {}; {short} trimmed or exited",
            long.join(", ")
        )
    };

    directional_score(
        SignalSource::Superinvestor,
        net,
        latest.len() as f64,
        HALF_SATURATION,
        obs.current.len(),
        description,
        obs.latest_date(),
    )
}
