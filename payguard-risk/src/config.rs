//! Risk pipeline configuration.

use crate::error::{RiskError, RiskResult};
use serde::{Deserialize, Serialize};

/// Configuration for the risk pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Topic the transaction records are consumed from.
    pub ingest_topic: String,

    /// Topic alert records are produced to.
    pub alert_topic: String,

    /// Number of parallel scoring lanes. Records with the same key always
    /// land in the same lane.
    pub lanes: usize,

    /// Queue depth per lane.
    pub lane_capacity: usize,

    /// Queue depth of the ingestion channel, and of the pass-through and
    /// scoring queues behind it.
    pub ingest_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ingest_topic: "transactions".to_string(),
            alert_topic: "risk-alerts".to_string(),
            lanes: 4,
            lane_capacity: 256,
            ingest_capacity: 1024,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> RiskResult<()> {
        if self.lanes == 0 {
            return Err(RiskError::Config("lanes must be at least 1".to_string()));
        }
        if self.lane_capacity == 0 || self.ingest_capacity == 0 {
            return Err(RiskError::Config(
                "channel capacities must be at least 1".to_string(),
            ));
        }
        if self.alert_topic.is_empty() {
            return Err(RiskError::Config("alert_topic is empty".to_string()));
        }
        if self.alert_topic == self.ingest_topic {
            return Err(RiskError::Config(
                "alert_topic must differ from ingest_topic".to_string(),
            ));
        }
        Ok(())
    }
}
