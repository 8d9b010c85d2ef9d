//! Trailing lookback windows.

use chrono::{Duration, NaiveDate};
use confluence_core::MAX_LOOKBACK_DAYS;
use serde::{Deserialize, Serialize};

/// Trailing window `(as_of - days, as_of]` in calendar days.
///
/// Events dated after `as_of` are never current, so backfilled runs for an
/// older date ignore later disclosures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackWindow {
    pub as_of: NaiveDate,
    pub days: i64,
}

impl LookbackWindow {
    /// Creates a window ending on `as_of` covering `days` calendar days.
    #[must_use]
    pub fn trailing(as_of: NaiveDate, days: i64) -> Self {
        Self {
            as_of,
            days: days.clamp(1, MAX_LOOKBACK_DAYS),
        }
    }

    /// Exclusive lower bound.
    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.as_of
            .checked_sub_signed(Duration::days(self.days))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Returns true if `date` is inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date > self.start() && date <= self.as_of
    }

    /// Returns true if `date` precedes the window (usable as a baseline).
    #[must_use]
    pub fn is_prior(&self, date: NaiveDate) -> bool {
        date <= self.start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn window_is_half_open() {
        let window = LookbackWindow::trailing(date(3, 31), 30);
        assert_eq!(window.start(), date(3, 1));
        assert!(!window.contains(date(3, 1)));
        assert!(window.contains(date(3, 2)));
        assert!(window.contains(date(3, 31)));
        assert!(!window.contains(date(4, 1)));
    }

    #[test]
    fn prior_dates_precede_window() {
        let window = LookbackWindow::trailing(date(3, 31), 30);
        assert!(window.is_prior(date(3, 1)));
        assert!(window.is_prior(date(1, 15)));
        assert!(!window.is_prior(date(3, 2)));
        assert!(!window.is_prior(date(4, 2)));
    }

    #[test]
    fn zero_day_window_is_widened_to_one() {
        let window = LookbackWindow::trailing(date(3, 31), 0);
        assert!(window.contains(date(3, 31)));
        assert!(!window.contains(date(3, 30)));
    }
}
