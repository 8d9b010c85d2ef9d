//! Exchange short interest reports.
//!
//! The change in short interest as a share of float between the latest report
//! and the one before it drives the score. Rising short interest is bearish,
//! covering is bullish. A high days-to-cover amplifies either reading.

use confluence_core::{Sign, ShortInterestReport, SignalSource, SourceScore};

use super::{saturate, Observations, ACTIVITY_FACTOR};

/// Change in percent of float (percentage points) that maps to 50 before the
/// days-to-cover boost.
pub const HALF_SATURATION: f64 = 2.0;

/// Changes smaller than this many percentage points are treated as flat.
pub const FLAT_THRESHOLD: f64 = 0.05;

/// Days-to-cover above this adds no further boost.
pub const MAX_DAYS_TO_COVER: f64 = 10.0;

/// Percent of float that maps to half the activity score of a flat report.
const FLOAT_HALF_SATURATION: f64 = 20.0;

pub fn score(obs: &Observations<'_, ShortInterestReport>) -> SourceScore {
    let reports: Vec<_> = obs.all().collect();
    let Some((_, latest)) = reports.last() else {
        return SourceScore::absent(SignalSource::ShortInterest);
    };

    let previous_pct = match reports.len().checked_sub(2) {
        Some(i) => reports[i].1.pct_float,
        None => implied_previous_pct(latest),
    };
    let delta = latest.pct_float - previous_pct;

    if delta.abs() < FLAT_THRESHOLD {
        let description = format!(
            "short interest flat at {:.1}% of float, {:.1} days to cover",
            latest.pct_float, latest.days_to_cover
        );
        return SourceScore::new(
            SignalSource::ShortInterest,
            100.0 * saturate(latest.pct_float, FLOAT_HALF_SATURATION) * ACTIVITY_FACTOR,
            Sign::Neutral,
            obs.current.len(),
            description,
            obs.latest_date(),
        );
    }

    let sign = if delta > 0.0 {
        Sign::Bearish
    } else {
        Sign::Bullish
    };
    let boost = 1.0 + latest.days_to_cover.min(MAX_DAYS_TO_COVER) / 20.0;
    let subscore = 100.0 * saturate(delta.abs(), HALF_SATURATION) * boost;

    let description = format!(
        "short interest {} {:.2}pp to {:.1}% of float, {:.1} days to cover",
        if delta > 0.0 { "up" } else { "down" },
        delta.abs(),
        latest.pct_float,
        latest.days_to_cover
    );

    SourceScore::new(
        SignalSource::ShortInterest,
        subscore,
        sign,
        obs.current.len(),
        description,
        obs.latest_date(),
    )
}

/// Percent of float before the reported change, when no earlier report exists.
fn implied_previous_pct(report: &ShortInterestReport) -> f64 {
    report.pct_float / (1.0 + report.change_pct / 100.0)
}
