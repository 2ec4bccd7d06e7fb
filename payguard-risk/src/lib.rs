//! Streaming transaction risk scoring for PayGuard.
//!
//! Consumes transaction records, scores each against a [`RiskRule`] and
//! produces [`AlertEvent`](payguard_types::AlertEvent)s for the ones that
//! trip it. Records that cannot be parsed are dropped, never fatal.
//!
//! ```text
//! ingest ──▶ RiskPipeline ──┬─▶ pass-through (optional, unchanged)
//!                           └─▶ lane[hash(key) % n] ──▶ RiskScorer ──▶ alerts
//! ```

pub mod amount;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod rule;
pub mod scorer;

pub use amount::{AmountExtractor, ParsedTransaction};
pub use config::PipelineConfig;
pub use error::{RiskError, RiskResult};
pub use pipeline::{
    create_risk_pipeline, lane_for_key, PipelineCommand, RiskPipeline, RiskPipelineHandle,
    StatsSnapshot,
};
pub use rule::{HighValueRule, RiskRule, HIGH_VALUE_THRESHOLD};
pub use scorer::{RiskScorer, ScoreOutcome};
