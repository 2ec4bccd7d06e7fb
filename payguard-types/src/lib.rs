//! Shared types for PayGuard.
//!
//! - [`Record`] / [`RecordValue`]: untyped records crossing the trust boundary
//! - [`TransactionEvent`]: events on the transaction ingestion stream
//! - [`AlertEvent`]: risk alerts, free of raw PII
//! - [`StreamRecord`]: keyed stream payloads

mod alert;
mod error;
mod record;
mod stream;
mod transaction;

pub use alert::{AlertEvent, AlertType, RiskLevel};
pub use error::{RecordError, RecordResult};
pub use record::{Record, RecordValue};
pub use stream::StreamRecord;
pub use transaction::{Channel, TransactionEvent, TransactionType};
