//! Per-record scoring.

use crate::amount::AmountExtractor;
use crate::error::{RiskError, RiskResult};
use crate::rule::{HighValueRule, RiskRule};
use payguard_types::{AlertEvent, StreamRecord};
use tracing::{debug, trace};

/// What happened to one stream record.
#[derive(Clone, Debug, PartialEq)]
pub enum ScoreOutcome {
    /// The record was scored and raised an alert.
    Alert(AlertEvent),
    /// The record was scored and raised nothing.
    NoAlert,
    /// The record had no value or could not be parsed, and was skipped.
    Dropped,
}

/// Scores raw transaction records against a rule.
///
/// Stateless between records; one scorer is shared by every lane.
pub struct RiskScorer {
    extractor: AmountExtractor,
    rule: Box<dyn RiskRule>,
}

impl RiskScorer {
    /// A scorer with the high-value rule.
    pub fn new() -> RiskResult<Self> {
        Self::with_rule(Box::new(HighValueRule::new()))
    }

    pub fn with_rule(rule: Box<dyn RiskRule>) -> RiskResult<Self> {
        Ok(Self {
            extractor: AmountExtractor::new()?,
            rule,
        })
    }

    pub fn rule_name(&self) -> &str {
        self.rule.name()
    }

    /// Scores one raw value. Parse failures are returned to the caller.
    pub fn evaluate(&self, raw: &str) -> RiskResult<Option<AlertEvent>> {
        let tx = self.extractor.extract(raw)?;
        Ok(self.rule.evaluate(&tx))
    }

    /// Scores one stream record, absorbing null values and parse failures.
    ///
    /// Only the record key is logged; the value may carry PII.
    pub fn score(&self, record: &StreamRecord) -> ScoreOutcome {
        let Some(raw) = record.value.as_deref() else {
            debug!(key = %record.key, "dropping record with null value");
            return ScoreOutcome::Dropped;
        };

        match self.evaluate(raw) {
            Ok(Some(alert)) => {
                trace!(key = %record.key, rule = self.rule.name(), "alert raised");
                ScoreOutcome::Alert(alert)
            }
            Ok(None) => ScoreOutcome::NoAlert,
            Err(RiskError::StreamParse(reason)) => {
                debug!(key = %record.key, %reason, "dropping unparseable record");
                ScoreOutcome::Dropped
            }
            Err(e) => {
                debug!(key = %record.key, error = %e, "dropping record");
                ScoreOutcome::Dropped
            }
        }
    }
}

impl std::fmt::Debug for RiskScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskScorer")
            .field("rule", &self.rule.name())
            .finish()
    }
}
