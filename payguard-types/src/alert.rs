//! Risk alerts emitted by the scorer.
//!
//! Alerts carry the amount and an optional reference to the triggering
//! event, never the parties or any other field of the original record.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    HighValueTx,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Wire form: `{"type":"HIGH_VALUE_TX","risk":"HIGH","amount":15000.0}`,
/// with `"eventId"` appended when the triggering event id is known.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub risk: RiskLevel,
    pub amount: f64,
    #[serde(rename = "eventId", default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl AlertEvent {
    pub fn high_value(amount: f64, event_id: Option<String>) -> Self {
        Self {
            alert_type: AlertType::HighValueTx,
            risk: RiskLevel::High,
            amount,
            event_id,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
