//! Quarterly institutional filings.
//!
//! Each institution's latest in-window filing is compared with its previous
//! filing, which may predate the window. The change in portfolio weight is
//! the evidence: new positions count in full and exits count as the whole
//! previous weight.

use chrono::NaiveDate;
use confluence_core::{InstitutionalFiling, SignalSource, SourceScore};
use std::collections::BTreeMap;

use super::{directional_score, Observations};

/// Net portfolio weight change (percentage points) that maps to a subscore of 50.
pub const HALF_SATURATION: f64 = 1.5;

pub fn score(obs: &Observations<'_, InstitutionalFiling>) -> SourceScore {
    let mut history: BTreeMap<&str, Vec<(NaiveDate, &InstitutionalFiling)>> = BTreeMap::new();
    for (date, filing) in obs.all() {
        history
            .entry(filing.institution.as_str())
            .or_default()
            .push((*date, *filing));
    }

    let mut net = 0.0;
    let mut gross = 0.0;
    let (mut added, mut reduced) = (0usize, 0usize);

    for (_, filing) in &obs.current {
        let Some(filings) = history.remove(filing.institution.as_str()) else {
            continue;
        };
        let delta = position_change(&filings);
        net += delta;
        gross += delta.abs();
        if delta > 0.0 {
            added += 1;
        } else if delta < 0.0 {
            reduced += 1;
        }
    }

    let description = format!(
        "{added} institution{} added, {reduced} reduced (net {net:+.2}% of portfolio)",
        if added == 1 { "" } else { "s" }
    );

    directional_score(
        SignalSource::Institutional,
        net,
        gross,
        HALF_SATURATION,
        obs.current.len(),
        description,
        obs.latest_date(),
    )
}

/// Portfolio weight change between the last two filings of one institution.
fn position_change(filings: &[(NaiveDate, &InstitutionalFiling)]) -> f64 {
    let Some((_, latest)) = filings.last() else {
        return 0.0;
    };
    let latest_pct = if latest.shares == 0 {
        0.0
    } else {
        latest.pct_of_portfolio
    };
    let previous_pct = filings
        .len()
        .checked_sub(2)
        .map_or(0.0, |i| filings[i].1.pct_of_portfolio);

    latest_pct - previous_pct
}
