//! Per-source normalized subscores.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::source::SignalSource;

/// Directional lean of a single source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Sign {
    /// -1: bearish-leaning evidence.
    Bearish,
    /// 0: no signal, or activity without a clear direction.
    Neutral,
    /// +1: bullish-leaning evidence.
    Bullish,
}

impl Sign {
    /// Returns the sign of a net evidence value.
    #[must_use]
    pub fn of(value: f64) -> Self {
        if value > 0.0 {
            Self::Bullish
        } else if value < 0.0 {
            Self::Bearish
        } else {
            Self::Neutral
        }
    }

    /// Returns -1, 0 or +1.
    #[must_use]
    pub const fn as_i8(self) -> i8 {
        match self {
            Self::Bearish => -1,
            Self::Neutral => 0,
            Self::Bullish => 1,
        }
    }

    /// Returns true for +1 and -1.
    #[must_use]
    pub const fn is_directional(self) -> bool {
        !matches!(self, Self::Neutral)
    }
}

impl From<Sign> for i8 {
    fn from(sign: Sign) -> Self {
        sign.as_i8()
    }
}

impl TryFrom<i8> for Sign {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Bearish),
            0 => Ok(Self::Neutral),
            1 => Ok(Self::Bullish),
            other => Err(format!("sign must be -1, 0 or 1, got {other}")),
        }
    }
}

/// Normalized contribution of one source for one ticker and as-of date.
///
/// Construct through [`SourceScore::new`] or [`SourceScore::absent`]; both
/// enforce the subscore range and the zero-subscore-is-neutral rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceScore {
    pub source: SignalSource,
    /// Normalized strength in [0, 100].
    pub subscore: f64,
    pub sign: Sign,
    /// Number of in-window events that contributed.
    pub event_count: usize,
    pub description: Option<String>,
    /// Date of the most recent contributing event.
    pub latest_event: Option<NaiveDate>,
}

impl SourceScore {
    /// Creates a score, clamping the subscore into [0, 100].
    ///
    /// A NaN subscore becomes 0, and a zero subscore is always neutral.
    pub fn new(
        source: SignalSource,
        subscore: f64,
        sign: Sign,
        event_count: usize,
        description: impl Into<String>,
        latest_event: Option<NaiveDate>,
    ) -> Self {
        let subscore = if subscore.is_nan() {
            0.0
        } else {
            subscore.clamp(0.0, 100.0)
        };
        let sign = if subscore > 0.0 { sign } else { Sign::Neutral };

        Self {
            source,
            subscore,
            sign,
            event_count,
            description: Some(description.into()),
            latest_event,
        }
    }

    /// A non-participating score: no events fell inside the window.
    #[must_use]
    pub const fn absent(source: SignalSource) -> Self {
        Self {
            source,
            subscore: 0.0,
            sign: Sign::Neutral,
            event_count: 0,
            description: None,
            latest_event: None,
        }
    }

    /// Returns true if the source takes part in the directional tally.
    #[must_use]
    pub fn participates(&self) -> bool {
        self.sign.is_directional() && self.subscore > 0.0
    }
}
