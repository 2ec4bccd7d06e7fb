//! Keyed records carried on ingestion, pass-through and alert streams.

use serde::{Deserialize, Serialize};

/// A single stream record. The key is the opaque partition key (account or
/// wallet id); the value is the serialized payload and may be absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecord {
    pub topic: String,
    pub key: String,
    pub value: Option<String>,
}

impl StreamRecord {
    pub fn new(topic: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// A record with a null value.
    pub fn tombstone(topic: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            key: key.into(),
            value: None,
        }
    }
}
