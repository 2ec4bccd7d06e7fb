//! Scoring rules.

use crate::amount::ParsedTransaction;
use payguard_types::AlertEvent;

/// Amounts strictly above this raise a high-value alert.
pub const HIGH_VALUE_THRESHOLD: f64 = 10_000.0;

/// A rule that looks at one parsed transaction and may raise an alert.
///
/// Rules are shared across scoring lanes, so they must be stateless or
/// internally synchronized.
pub trait RiskRule: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, tx: &ParsedTransaction) -> Option<AlertEvent>;
}

/// Flags transactions whose amount is strictly greater than a threshold.
#[derive(Clone, Debug)]
pub struct HighValueRule {
    threshold: f64,
}

impl HighValueRule {
    pub fn new() -> Self {
        Self::with_threshold(HIGH_VALUE_THRESHOLD)
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for HighValueRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskRule for HighValueRule {
    fn name(&self) -> &str {
        "high_value"
    }

    fn evaluate(&self, tx: &ParsedTransaction) -> Option<AlertEvent> {
        (tx.amount > self.threshold).then(|| AlertEvent::high_value(tx.amount, tx.event_id.clone()))
    }
}
