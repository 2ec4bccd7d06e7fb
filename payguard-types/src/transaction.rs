//! Transaction events produced by the transaction domain.

use crate::stream::StreamRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of money movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Transfer,
    Payment,
    Deposit,
    Withdrawal,
    Reversal,
}

/// Channel through which the transaction was initiated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    Mobile,
    Web,
    Pos,
    Atm,
    Ussd,
    Api,
}

/// An immutable transaction event as it appears on the ingestion stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEvent {
    pub transaction_id: String,
    pub amount: f64,
    pub currency: String,
    pub source_account: String,
    pub destination_account: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub channel: Channel,
    pub timestamp: DateTime<Utc>,
}

impl TransactionEvent {
    /// Creates an event with a fresh time-ordered id, stamped now.
    pub fn new(
        amount: f64,
        currency: impl Into<String>,
        source_account: impl Into<String>,
        destination_account: impl Into<String>,
        transaction_type: TransactionType,
        channel: Channel,
    ) -> Self {
        Self {
            transaction_id: Uuid::now_v7().to_string(),
            amount,
            currency: currency.into(),
            source_account: source_account.into(),
            destination_account: destination_account.into(),
            transaction_type,
            channel,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Wraps the serialized event in a stream record partitioned by the
    /// source account.
    pub fn to_stream_record(&self, topic: &str) -> Result<StreamRecord, serde_json::Error> {
        Ok(StreamRecord::new(topic, &self.source_account, self.to_json()?))
    }
}
