//! Source reliability weights.
//!
//! The table is immutable once loaded and is passed explicitly into every
//! aggregation. A missing weight is a configuration bug and fails loudly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ConfluenceError, ConfluenceResult};
use crate::source::SignalSource;

/// Name of the context that uses only the base weights.
pub const DEFAULT_CONTEXT: &str = "default";

/// Versioned mapping of source to reliability weight, with named overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceWeightTable {
    /// Version tag recorded in run logs.
    pub version: String,
    /// Base weights, used by the default context and as fallback.
    #[serde(rename = "default")]
    pub base: BTreeMap<SignalSource, f64>,
    /// Named contexts overriding a subset of the base weights.
    #[serde(default)]
    pub contexts: BTreeMap<String, BTreeMap<SignalSource, f64>>,
}

impl Default for SourceWeightTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl SourceWeightTable {
    /// Creates a table from base weights without contexts.
    pub fn new(version: impl Into<String>, base: BTreeMap<SignalSource, f64>) -> Self {
        Self {
            version: version.into(),
            base,
            contexts: BTreeMap::new(),
        }
    }

    /// The shipped weights.
    ///
    /// Insider clusters and legislative trades carry the most evidence per
    /// event; off-exchange anomalies are frequent and noisy. The `crypto`
    /// context lifts the ETF and off-exchange sources, which dominate
    /// coverage of crypto-adjacent names.
    #[must_use]
    pub fn standard() -> Self {
        let base = BTreeMap::from([
            (SignalSource::Congress, 1.0),
            (SignalSource::Ark, 0.9),
            (SignalSource::DarkPool, 0.7),
            (SignalSource::Institutional, 0.8),
            (SignalSource::Insider, 1.2),
            (SignalSource::ShortInterest, 0.9),
            (SignalSource::Superinvestor, 1.0),
        ]);
        let crypto = BTreeMap::from([
            (SignalSource::Ark, 1.5),
            (SignalSource::DarkPool, 1.0),
            (SignalSource::Institutional, 1.0),
        ]);

        Self {
            version: "2025.1".to_string(),
            base,
            contexts: BTreeMap::from([("crypto".to_string(), crypto)]),
        }
    }

    /// Adds or replaces a named context.
    #[must_use]
    pub fn with_context(
        mut self,
        name: impl Into<String>,
        overrides: BTreeMap<SignalSource, f64>,
    ) -> Self {
        self.contexts.insert(name.into(), overrides);
        self
    }

    /// Looks up the weight of a source in a context.
    ///
    /// # Errors
    /// `UnknownWeightContext` if the context is not defined,
    /// `UnknownSourceWeight` if neither the context nor the base table
    /// weights the source.
    pub fn weight(&self, source: SignalSource, context: &str) -> ConfluenceResult<f64> {
        if context != DEFAULT_CONTEXT {
            let overrides = self
                .contexts
                .get(context)
                .ok_or_else(|| ConfluenceError::UnknownWeightContext(context.to_string()))?;
            if let Some(weight) = overrides.get(&source) {
                return Ok(*weight);
            }
        }

        self.base
            .get(&source)
            .copied()
            .ok_or_else(|| ConfluenceError::UnknownSourceWeight {
                signal_source: source,
                context: context.to_string(),
            })
    }

    /// Checks every weight is finite and strictly positive.
    ///
    /// # Errors
    /// Returns `InvalidConfig` naming the offending entry.
    pub fn validate(&self) -> ConfluenceResult<()> {
        let check = |context: &str, source: &SignalSource, weight: f64| {
            if weight.is_finite() && weight > 0.0 {
                Ok(())
            } else {
                Err(ConfluenceError::InvalidConfig(format!(
                    "weight for {source} in context '{context}' must be > 0, got {weight}"
                )))
            }
        };

        for (source, weight) in &self.base {
            check(DEFAULT_CONTEXT, source, *weight)?;
        }
        for (name, overrides) in &self.contexts {
            for (source, weight) in overrides {
                check(name, source, *weight)?;
            }
        }
        Ok(())
    }

    /// Verifies that every known source resolves to a weight in `context`.
    ///
    /// Run before a batch starts so a gap aborts the run up front.
    ///
    /// # Errors
    /// Returns the first lookup failure.
    pub fn ensure_complete(&self, context: &str) -> ConfluenceResult<()> {
        self.validate()?;
        for source in SignalSource::ALL {
            self.weight(source, context)?;
        }
        Ok(())
    }
}
