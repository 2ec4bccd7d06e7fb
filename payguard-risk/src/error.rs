//! Risk pipeline error types.

use thiserror::Error;

/// Result type for risk scoring operations.
pub type RiskResult<T> = Result<T, RiskError>;

/// Errors that can occur in the risk scorer and its pipeline.
///
/// `StreamParse` is recovered inside the scorer: the record is logged and
/// dropped, and the stream continues.
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("stream record could not be parsed: {0}")]
    StreamParse(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("risk pipeline not running")]
    ChannelClosed,

    #[error("invalid configuration: {0}")]
    Config(String),
}
