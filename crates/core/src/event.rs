//! Raw smart-money observations as delivered by upstream collectors.
//!
//! Each source has its own payload schema; [`EventPayload`] is the tagged
//! union the normalizer dispatches on.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ConfluenceError, ConfluenceResult};
use crate::source::SignalSource;

/// Directional hint carried by trade-like events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    /// Purchase / increase.
    #[serde(alias = "purchase", alias = "Purchase", alias = "Buy", alias = "P")]
    Buy,
    /// Sale / decrease.
    #[serde(
        alias = "sale",
        alias = "Sale",
        alias = "Sell",
        alias = "sale_full",
        alias = "sale_partial",
        alias = "S"
    )]
    Sell,
}

impl TradeSide {
    /// Returns +1.0 for buys and -1.0 for sells.
    #[must_use]
    pub const fn signum(self) -> f64 {
        match self {
            Self::Buy => 1.0,
            Self::Sell => -1.0,
        }
    }
}

/// Legislative trade disclosure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CongressTrade {
    pub trader: String,
    pub chamber: String,
    #[serde(default)]
    pub party: Option<String>,
    pub transaction_type: TradeSide,
    /// Disclosed amount bucket, e.g. `"$1,001 - $15,000"`.
    pub amount_range: String,
    pub transaction_date: NaiveDate,
    pub disclosure_date: NaiveDate,
}

/// Daily trade by an innovation-fund ETF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtfTrade {
    pub fund: String,
    pub shares: i64,
    /// Position weight in the fund, percent of AUM.
    pub weight_pct: f64,
    pub trade_type: TradeSide,
}

/// Off-exchange (dark pool) volume observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DarkPoolVolume {
    /// Z-score of off-exchange volume against its trailing baseline.
    pub zscore: f64,
    pub off_exchange_pct: f64,
    /// Short-sale share of the off-exchange volume, percent.
    pub short_pct: f64,
    pub total_volume: u64,
}

/// Institutional quarterly holding filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionalFiling {
    pub institution: String,
    pub shares: i64,
    pub value: Decimal,
    pub pct_of_portfolio: f64,
}

/// Corporate insider transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderTransaction {
    pub insider_name: String,
    pub title: String,
    pub transaction_type: TradeSide,
    pub shares: i64,
    pub value: Decimal,
    /// Part of a cluster of insiders trading the same way.
    #[serde(default)]
    pub is_cluster: bool,
}

/// Bi-monthly short-interest report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortInterestReport {
    pub short_interest: u64,
    /// Change versus the previous report, percent.
    pub change_pct: f64,
    pub days_to_cover: f64,
    /// Short interest as percent of float.
    pub pct_float: f64,
}

/// Notable-investor portfolio holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperinvestorHolding {
    pub fund_name: String,
    pub shares: i64,
    pub value: Decimal,
    /// Signed change in shares versus the fund's previous filing.
    #[serde(default)]
    pub share_change: i64,
}

/// Source-specific payload, tagged by source identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source")]
pub enum EventPayload {
    #[serde(rename = "congress")]
    Congress(CongressTrade),
    #[serde(rename = "ark")]
    Ark(EtfTrade),
    #[serde(rename = "darkpool")]
    DarkPool(DarkPoolVolume),
    #[serde(rename = "institutional")]
    Institutional(InstitutionalFiling),
    #[serde(rename = "insider")]
    Insider(InsiderTransaction),
    #[serde(rename = "short_interest")]
    ShortInterest(ShortInterestReport),
    #[serde(rename = "superinvestor")]
    Superinvestor(SuperinvestorHolding),
}

impl EventPayload {
    /// Returns the source this payload belongs to.
    #[must_use]
    pub const fn source(&self) -> SignalSource {
        match self {
            Self::Congress(_) => SignalSource::Congress,
            Self::Ark(_) => SignalSource::Ark,
            Self::DarkPool(_) => SignalSource::DarkPool,
            Self::Institutional(_) => SignalSource::Institutional,
            Self::Insider(_) => SignalSource::Insider,
            Self::ShortInterest(_) => SignalSource::ShortInterest,
            Self::Superinvestor(_) => SignalSource::Superinvestor,
        }
    }
}

/// One raw observation for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub ticker: String,
    pub event_date: NaiveDate,
    pub payload: EventPayload,
}

impl SignalEvent {
    /// Creates a new event.
    pub fn new(ticker: impl Into<String>, event_date: NaiveDate, payload: EventPayload) -> Self {
        Self {
            ticker: ticker.into(),
            event_date,
            payload,
        }
    }

    /// Returns the source of this event.
    #[must_use]
    pub const fn source(&self) -> SignalSource {
        self.payload.source()
    }

    /// Validates the event against its source schema.
    ///
    /// # Errors
    /// Returns `MalformedEvent` describing the first violated constraint.
    pub fn validate(&self) -> ConfluenceResult<()> {
        let fail = |reason: String| Err(ConfluenceError::malformed(&self.ticker, self.source(), reason));

        if self.ticker.trim().is_empty() {
            return fail("empty ticker".to_string());
        }

        match &self.payload {
            EventPayload::Congress(t) => {
                if t.trader.trim().is_empty() {
                    return fail("missing trader".to_string());
                }
                if AmountRange::from_str(&t.amount_range).is_err() {
                    return fail(format!("unparseable amount range '{}'", t.amount_range));
                }
                if t.disclosure_date < t.transaction_date {
                    return fail("disclosure precedes transaction".to_string());
                }
            }
            EventPayload::Ark(t) => {
                if t.shares <= 0 {
                    return fail(format!("non-positive share count {}", t.shares));
                }
                if !is_percent(t.weight_pct) {
                    return fail(format!("weight_pct out of range: {}", t.weight_pct));
                }
            }
            EventPayload::DarkPool(v) => {
                if !v.zscore.is_finite() {
                    return fail("non-finite zscore".to_string());
                }
                if !is_percent(v.off_exchange_pct) || !is_percent(v.short_pct) {
                    return fail("percent field out of range".to_string());
                }
            }
            EventPayload::Institutional(f) => {
                if f.institution.trim().is_empty() {
                    return fail("missing institution".to_string());
                }
                if f.shares < 0 || f.value < Decimal::ZERO {
                    return fail("negative holding".to_string());
                }
                if !is_percent(f.pct_of_portfolio) {
                    return fail(format!("pct_of_portfolio out of range: {}", f.pct_of_portfolio));
                }
            }
            EventPayload::Insider(t) => {
                if t.shares <= 0 {
                    return fail(format!("non-positive share count {}", t.shares));
                }
                if t.value < Decimal::ZERO {
                    return fail("negative transaction value".to_string());
                }
            }
            EventPayload::ShortInterest(r) => {
                if !is_percent(r.pct_float) {
                    return fail(format!("pct_float out of range: {}", r.pct_float));
                }
                if !r.change_pct.is_finite() || r.change_pct <= -100.0 {
                    return fail(format!("invalid change_pct {}", r.change_pct));
                }
                if !r.days_to_cover.is_finite() || r.days_to_cover < 0.0 {
                    return fail(format!("invalid days_to_cover {}", r.days_to_cover));
                }
            }
            EventPayload::Superinvestor(h) => {
                if h.fund_name.trim().is_empty() {
                    return fail("missing fund name".to_string());
                }
                if h.shares < 0 || h.value < Decimal::ZERO {
                    return fail("negative holding".to_string());
                }
            }
        }

        Ok(())
    }
}

fn is_percent(value: f64) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

/// Disclosed dollar bucket of a legislative trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountRange {
    /// Lower bound in dollars.
    pub low: Decimal,
    /// Upper bound in dollars, `None` for open-ended buckets.
    pub high: Option<Decimal>,
}

impl AmountRange {
    /// Midpoint of the bucket (the lower bound for open-ended buckets).
    #[must_use]
    pub fn midpoint(&self) -> Decimal {
        match self.high {
            Some(high) => (self.low + high) / Decimal::TWO,
            None => self.low,
        }
    }
}

impl FromStr for AmountRange {
    type Err = anyhow::Error;

    /// Parses `"$1,001 - $15,000"`, `"$50,000,000 +"`, `"Over $50,000,000"`
    /// and single amounts like `"$250,000"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = s.trim();
        if cleaned.is_empty() {
            anyhow::bail!("empty amount range");
        }

        let parse_amount = |part: &str| -> anyhow::Result<Decimal> {
            let digits: String = part
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            if digits.is_empty() {
                anyhow::bail!("no digits in '{}'", part);
            }
            Ok(Decimal::from_str(&digits)?)
        };

        let lower = cleaned.to_lowercase();
        if lower.starts_with("over") || cleaned.ends_with('+') {
            return Ok(Self {
                low: parse_amount(cleaned)?,
                high: None,
            });
        }

        match cleaned.split_once('-') {
            Some((low, high)) => {
                let low = parse_amount(low)?;
                let high = parse_amount(high)?;
                if high < low {
                    anyhow::bail!("inverted amount range '{}'", s);
                }
                Ok(Self {
                    low,
                    high: Some(high),
                })
            }
            None => {
                let amount = parse_amount(cleaned)?;
                Ok(Self {
                    low: amount,
                    high: Some(amount),
                })
            }
        }
    }
}
