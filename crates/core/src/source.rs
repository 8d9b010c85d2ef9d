//! Known smart-money signal sources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One independent smart-money observation stream.
///
/// The declaration order is the canonical order used for details, JSON
/// fields and table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalSource {
    /// Legislative trade disclosures.
    #[serde(rename = "congress")]
    Congress,
    /// Innovation-fund ETF daily trades.
    #[serde(rename = "ark")]
    Ark,
    /// Off-exchange volume anomalies.
    #[serde(rename = "darkpool")]
    DarkPool,
    /// Institutional quarterly filings (13F).
    #[serde(rename = "institutional")]
    Institutional,
    /// Corporate insider transactions (Form 4).
    #[serde(rename = "insider")]
    Insider,
    /// Short-interest reports.
    #[serde(rename = "short_interest")]
    ShortInterest,
    /// Notable-investor portfolio filings.
    #[serde(rename = "superinvestor")]
    Superinvestor,
}

impl SignalSource {
    /// Every known source in canonical order.
    pub const ALL: [SignalSource; 7] = [
        Self::Congress,
        Self::Ark,
        Self::DarkPool,
        Self::Institutional,
        Self::Insider,
        Self::ShortInterest,
        Self::Superinvestor,
    ];

    /// Returns the stable identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Congress => "congress",
            Self::Ark => "ark",
            Self::DarkPool => "darkpool",
            Self::Institutional => "institutional",
            Self::Insider => "insider",
            Self::ShortInterest => "short_interest",
            Self::Superinvestor => "superinvestor",
        }
    }

    /// Name of the per-source field in the produced JSON record.
    #[must_use]
    pub const fn score_field(&self) -> &'static str {
        match self {
            Self::Congress => "congress_score",
            Self::Ark => "ark_score",
            Self::DarkPool => "darkpool_score",
            Self::Institutional => "institutional_score",
            Self::Insider => "insider_score",
            Self::ShortInterest => "short_interest_score",
            Self::Superinvestor => "superinvestor_score",
        }
    }

    /// Parses an identifier or a common alias (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "congress" | "legislative" | "politician" => Some(Self::Congress),
            "ark" | "etf" => Some(Self::Ark),
            "darkpool" | "dark_pool" | "off_exchange" => Some(Self::DarkPool),
            "institutional" | "13f" | "institution" => Some(Self::Institutional),
            "insider" | "form4" => Some(Self::Insider),
            "short_interest" | "short" | "si" => Some(Self::ShortInterest),
            "superinvestor" | "superinvestors" | "guru" => Some(Self::Superinvestor),
            _ => None,
        }
    }
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SignalSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown signal source: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_round_trip_through_parse() {
        for source in SignalSource::ALL {
            assert_eq!(SignalSource::parse(source.as_str()), Some(source));
        }
    }

    #[test]
    fn aliases_are_case_insensitive() {
        assert_eq!(SignalSource::parse("SI"), Some(SignalSource::ShortInterest));
        assert_eq!(SignalSource::parse("13F"), Some(SignalSource::Institutional));
        assert_eq!(SignalSource::parse(" Dark_Pool "), Some(SignalSource::DarkPool));
        assert!(SignalSource::parse("options_flow").is_none());
    }

    #[test]
    fn serde_uses_identifiers() {
        let json = serde_json::to_string(&SignalSource::ShortInterest).unwrap();
        assert_eq!(json, "\"short_interest\"");
        let parsed: SignalSource = serde_json::from_str("\"darkpool\"").unwrap();
        assert_eq!(parsed, SignalSource::DarkPool);
    }

    #[test]
    fn score_fields_follow_identifier() {
        for source in SignalSource::ALL {
            assert_eq!(source.score_field(), format!("{}_score", source.as_str()));
        }
    }
}
