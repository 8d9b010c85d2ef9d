use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ConfluenceError, ConfluenceResult};
use crate::source::SignalSource;
use crate::weights::{SourceWeightTable, DEFAULT_CONTEXT};

/// Longest accepted lookback window, in days.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub engine: EngineConfig,
    pub scheduler: SchedulerConfig,
    pub weights: SourceWeightTable,
}

impl AppConfig {
    /// Validates every section and the weight table for the configured context.
    ///
    /// # Errors
    /// Returns `InvalidConfig` or a weight lookup error.
    pub fn validate(&self) -> ConfluenceResult<()> {
        self.engine.validate()?;
        self.scheduler.validate()?;
        self.weights.ensure_complete(&self.engine.weight_context)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/confluence".to_string(),
            max_connections: 10,
        }
    }
}

/// Aggregation constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfluenceParams {
    /// Multiplier added per corroborating source beyond the first.
    pub bonus_per_extra_source: f64,
    /// Upper bound of the confluence multiplier.
    pub multiplier_cap: f64,
    /// min(P, N) / max(P, N) above which the call is mixed.
    pub mixed_threshold: f64,
}

impl Default for ConfluenceParams {
    fn default() -> Self {
        Self {
            bonus_per_extra_source: 0.15,
            multiplier_cap: 1.5,
            mixed_threshold: 0.6,
        }
    }
}

impl ConfluenceParams {
    /// Confluence multiplier for `agreeing` corroborating sources.
    #[must_use]
    pub fn multiplier(&self, agreeing: usize) -> f64 {
        if agreeing <= 1 {
            return 1.0;
        }
        let extra = (agreeing - 1) as f64;
        (1.0 + self.bonus_per_extra_source * extra).min(self.multiplier_cap)
    }

    /// # Errors
    /// Returns `InvalidConfig` for out-of-range constants.
    pub fn validate(&self) -> ConfluenceResult<()> {
        if !self.bonus_per_extra_source.is_finite() || self.bonus_per_extra_source < 0.0 {
            return Err(ConfluenceError::InvalidConfig(format!(
                "bonus_per_extra_source must be >= 0, got {}",
                self.bonus_per_extra_source
            )));
        }
        if !self.multiplier_cap.is_finite() || self.multiplier_cap < 1.0 {
            return Err(ConfluenceError::InvalidConfig(format!(
                "multiplier_cap must be >= 1, got {}",
                self.multiplier_cap
            )));
        }
        if !(self.mixed_threshold > 0.0 && self.mixed_threshold <= 1.0) {
            return Err(ConfluenceError::InvalidConfig(format!(
                "mixed_threshold must be in (0, 1], got {}",
                self.mixed_threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default trailing window in days.
    pub lookback_days: i64,
    /// Per-source window overrides (quarterly filings need longer windows).
    pub source_lookback_days: BTreeMap<SignalSource, i64>,
    /// Weight context used for this deployment.
    pub weight_context: String,
    pub params: ConfluenceParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            source_lookback_days: BTreeMap::from([
                (SignalSource::Institutional, 120),
                (SignalSource::Superinvestor, 120),
            ]),
            weight_context: DEFAULT_CONTEXT.to_string(),
            params: ConfluenceParams::default(),
        }
    }
}

impl EngineConfig {
    /// Lookback in days for a source.
    #[must_use]
    pub fn lookback_for(&self, source: SignalSource) -> i64 {
        self.source_lookback_days
            .get(&source)
            .copied()
            .unwrap_or(self.lookback_days)
    }

    /// Longest lookback across all sources.
    #[must_use]
    pub fn max_lookback(&self) -> i64 {
        SignalSource::ALL
            .into_iter()
            .map(|s| self.lookback_for(s))
            .max()
            .unwrap_or(self.lookback_days)
    }

    /// # Errors
    /// Returns `InvalidConfig` for windows outside `1..=MAX_LOOKBACK_DAYS` or bad params.
    pub fn validate(&self) -> ConfluenceResult<()> {
        for source in SignalSource::ALL {
            let days = self.lookback_for(source);
            if !(1..=MAX_LOOKBACK_DAYS).contains(&days) {
                return Err(ConfluenceError::InvalidConfig(format!(
                    "lookback for {source} must be within 1..={MAX_LOOKBACK_DAYS} days, got {days}"
                )));
            }
        }
        self.params.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Six-field cron expression (seconds first).
    pub cron_schedule: String,
    /// Upper bound on concurrently computed tickers.
    pub max_concurrency: usize,
    /// Write attempts per record before the ticker is marked failed.
    pub persist_retries: u32,
    pub retry_base_delay_ms: u64,
    /// Tickers scored on every run.
    pub universe: Vec<String>,
    /// Event file consumed when no event database is configured.
    pub events_path: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cron_schedule: "0 30 22 * * Mon-Fri".to_string(),
            max_concurrency: 8,
            persist_retries: 3,
            retry_base_delay_ms: 200,
            universe: Vec::new(),
            events_path: None,
        }
    }
}

impl SchedulerConfig {
    /// # Errors
    /// Returns `InvalidConfig` for a zero-sized pool or zero attempts.
    pub fn validate(&self) -> ConfluenceResult<()> {
        if self.max_concurrency == 0 {
            return Err(ConfluenceError::InvalidConfig(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.persist_retries == 0 {
            return Err(ConfluenceError::InvalidConfig(
                "persist_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn multiplier_starts_at_one_and_saturates() {
        let params = ConfluenceParams::default();
        assert!((params.multiplier(0) - 1.0).abs() < f64::EPSILON);
        assert!((params.multiplier(1) - 1.0).abs() < f64::EPSILON);
        assert!((params.multiplier(2) - 1.15).abs() < 1e-12);
        assert!((params.multiplier(4) - 1.45).abs() < 1e-12);
        assert!((params.multiplier(7) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_range_params() {
        let params = ConfluenceParams {
            multiplier_cap: 0.8,
            ..ConfluenceParams::default()
        };
        assert!(params.validate().is_err());

        let params = ConfluenceParams {
            mixed_threshold: 0.0,
            ..ConfluenceParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn per_source_lookback_overrides_default() {
        let engine = EngineConfig::default();
        assert_eq!(engine.lookback_for(SignalSource::Congress), 30);
        assert_eq!(engine.lookback_for(SignalSource::Institutional), 120);
        assert_eq!(engine.max_lookback(), 120);
    }

    #[test]
    fn oversized_lookback_is_rejected() {
        let mut config = AppConfig::default();
        config.engine.lookback_days = 1_000_000_000_000;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config
            .engine
            .source_lookback_days
            .insert(SignalSource::Superinvestor, MAX_LOOKBACK_DAYS + 1);
        assert!(config.validate().is_err());

        config
            .engine
            .source_lookback_days
            .insert(SignalSource::Superinvestor, MAX_LOOKBACK_DAYS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_weight_context_invalidates_config() {
        let mut config = AppConfig::default();
        config.engine.weight_context = "biotech".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = AppConfig::default();
        config.scheduler.max_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
