//! Record error types.

use thiserror::Error;

/// Result type for record parsing and rendering.
pub type RecordResult<T> = Result<T, RecordError>;

/// Errors that can occur converting records to and from JSON.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record is not a JSON object")]
    NotAnObject,
}
