//! Row model for the `signal_events` table.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use confluence_core::{EventPayload, SignalEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A raw event as stored by the upstream collectors.
///
/// `payload` holds the tagged event payload, including its `source` tag.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SignalEventRow {
    #[sqlx(default)]
    pub id: Option<i64>,
    pub ticker: String,
    pub event_date: NaiveDate,
    pub source: String,
    pub payload: JsonValue,
    #[sqlx(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl SignalEventRow {
    /// Converts an event into its row form.
    ///
    /// # Errors
    /// Returns an error if the payload cannot be serialized.
    pub fn from_event(event: &SignalEvent) -> Result<Self> {
        Ok(Self {
            id: None,
            ticker: event.ticker.clone(),
            event_date: event.event_date,
            source: event.source().as_str().to_string(),
            payload: serde_json::to_value(&event.payload)?,
            created_at: None,
        })
    }

    /// Decodes the stored payload.
    ///
    /// # Errors
    /// Returns an error if the payload does not match any known source.
    pub fn into_event(self) -> Result<SignalEvent> {
        let payload: EventPayload = serde_json::from_value(self.payload)
            .with_context(|| format!("undecodable {} payload for {}", self.source, self.ticker))?;
        Ok(SignalEvent::new(self.ticker, self.event_date, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confluence_core::{EtfTrade, TradeSide};

    #[test]
    fn payload_keeps_source_tag() {
        let event = SignalEvent::new(
            "COIN",
            NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            EventPayload::Ark(EtfTrade {
                fund: "ARKW".to_string(),
                shares: 5_000,
                weight_pct: 0.4,
                trade_type: TradeSide::Sell,
            }),
        );

        let row = SignalEventRow::from_event(&event).unwrap();
        assert_eq!(row.source, "ark");
        assert_eq!(row.payload["source"], "ark");

        assert_eq!(row.into_event().unwrap(), event);
    }
}
