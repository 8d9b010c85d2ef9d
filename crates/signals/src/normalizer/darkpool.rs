//! Off-exchange volume anomalies.
//!
//! Strength comes from the largest positive volume z-score in the window.
//! Direction comes from the short-sale share of that day's volume: heavy
//! shorting reads bearish, light shorting reads bullish.

use confluence_core::{DarkPoolVolume, Sign, SignalSource, SourceScore};

use super::Observations;

/// Z-score scale for the `tanh` squash.
pub const ZSCORE_SCALE: f64 = 3.0;

/// Short share above which volume reads bearish.
pub const BEARISH_SHORT_PCT: f64 = 55.0;

/// Short share below which volume reads bullish.
pub const BULLISH_SHORT_PCT: f64 = 45.0;

pub fn score(obs: &Observations<'_, DarkPoolVolume>) -> SourceScore {
    let peak = obs
        .current
        .iter()
        .max_by(|a, b| a.1.zscore.total_cmp(&b.1.zscore));

    let Some((peak_date, peak)) = peak else {
        return SourceScore::absent(SignalSource::DarkPool);
    };

    if peak.zscore <= 0.0 {
        return SourceScore::new(
            SignalSource::DarkPool,
            0.0,
            Sign::Neutral,
            obs.current.len(),
            "no abnormal off-exchange volume",
            obs.latest_date(),
        );
    }

    let sign = short_bias(peak.short_pct);
    let subscore = 100.0 * (peak.zscore / ZSCORE_SCALE).tanh();
    let description = format!(
        "{:.1}σ volume on {peak_date}, {:.0}% off-exchange, {:.0}% short",
        peak.zscore, peak.off_exchange_pct, peak.short_pct
    );

    SourceScore::new(
        SignalSource::DarkPool,
        subscore,
        sign,
        obs.current.len(),
        description,
        obs.latest_date(),
    )
}

/// Direction implied by the short-sale share of volume.
#[must_use]
pub fn short_bias(short_pct: f64) -> Sign {
    if short_pct > BEARISH_SHORT_PCT {
        Sign::Bearish
    } else if short_pct < BULLISH_SHORT_PCT {
        Sign::Bullish
    } else {
        Sign::Neutral
    }
}
