//! Error types for the confluence engine.
//!
//! Failures are isolated at the smallest reasonable unit (event, source,
//! ticker, run). Only configuration errors are allowed to abort a batch run.

use chrono::NaiveDate;
use thiserror::Error;

use crate::source::SignalSource;

/// Errors produced by the scoring core and its collaborators.
#[derive(Debug, Error)]
pub enum ConfluenceError {
    /// Upstream collector produced nothing or failed entirely for a source.
    ///
    /// Not a scoring failure: the source simply does not participate.
    #[error("source unavailable for {ticker}: {reason}")]
    SourceUnavailable {
        /// Ticker whose events could not be fetched.
        ticker: String,
        /// Why the source was unavailable.
        reason: String,
    },

    /// An individual event failed validation and was dropped.
    #[error("malformed {signal_source} event for {ticker}: {reason}")]
    MalformedEvent {
        /// Ticker the event belongs to.
        ticker: String,
        /// Source of the event.
        signal_source: SignalSource,
        /// Validation failure.
        reason: String,
    },

    /// No weight is configured for a source. Fatal for the batch run.
    #[error("no weight configured for source '{signal_source}' (context '{context}')")]
    UnknownSourceWeight {
        /// The unweighted source.
        signal_source: SignalSource,
        /// Context that was looked up.
        context: String,
    },

    /// A weight context was requested that the table does not define.
    #[error("unknown weight context '{0}'")]
    UnknownWeightContext(String),

    /// Configuration values failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Writing a record failed after all retries.
    #[error("failed to persist {ticker} @ {signal_date} after {attempts} attempts: {message}")]
    PersistenceWrite {
        /// Ticker of the record.
        ticker: String,
        /// As-of date of the record.
        signal_date: NaiveDate,
        /// Number of attempts made.
        attempts: u32,
        /// Last error message.
        message: String,
    },
}

impl ConfluenceError {
    /// Creates a malformed event error.
    pub fn malformed(
        ticker: impl Into<String>,
        source: SignalSource,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedEvent {
            ticker: ticker.into(),
            signal_source: source,
            reason: reason.into(),
        }
    }

    /// Returns true if this error must abort the whole batch run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnknownSourceWeight { .. } | Self::UnknownWeightContext(_) | Self::InvalidConfig(_)
        )
    }
}

/// Convenience alias for results in the scoring core.
pub type ConfluenceResult<T> = Result<T, ConfluenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_fatal() {
        let err = ConfluenceError::UnknownSourceWeight {
            signal_source: SignalSource::Insider,
            context: "default".to_string(),
        };
        assert!(err.is_fatal());
        assert!(ConfluenceError::UnknownWeightContext("crypto".into()).is_fatal());
        assert!(ConfluenceError::InvalidConfig("bad".into()).is_fatal());
    }

    #[test]
    fn data_errors_are_not_fatal() {
        let err = ConfluenceError::malformed("AAPL", SignalSource::Congress, "bad amount");
        assert!(!err.is_fatal());
        assert_eq!(
            err.to_string(),
            "malformed congress event for AAPL: bad amount"
        );
    }

    #[test]
    fn unknown_weight_message_names_source_and_context() {
        let err = ConfluenceError::UnknownSourceWeight {
            signal_source: SignalSource::ShortInterest,
            context: "crypto".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no weight configured for source 'short_interest' (context 'crypto')"
        );
    }
}
