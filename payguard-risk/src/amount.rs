//! Tolerant amount extraction from raw transaction records.
//!
//! A record is first read as a JSON object and its top-level `amount` taken
//! (a number, or a string holding a decimal number). When that fails the raw
//! text is scanned for an `"amount": <number>` pattern, which also finds
//! amounts nested inside wrapper objects or in text that is not quite JSON.

use crate::error::{RiskError, RiskResult};
use payguard_types::{Record, RecordValue};
use regex_lite::Regex;

const AMOUNT_FIELD: &str = "amount";

// A quoted amount must be the whole string; a bare one must end at a JSON
// delimiter. Either way a malformed value such as "15,000.00" does not match.
const AMOUNT_PATTERN: &str = concat!(
    r#""amount"\s*:\s*(?:"\s*(-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?)\s*""#,
    r#"|(-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?)(?:[\s,}\]]|$))"#,
);

/// Fields consulted, in order, for the triggering event's id.
pub const EVENT_ID_FIELDS: [&str; 4] = ["transactionId", "transaction_id", "id", "reference"];

/// The parts of a transaction record the scoring rules look at.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedTransaction {
    pub amount: f64,
    pub event_id: Option<String>,
    /// The record, when the value was a JSON object.
    pub record: Option<Record>,
}

/// Compiled extraction patterns.
#[derive(Clone, Debug)]
pub struct AmountExtractor {
    pattern: Regex,
}

impl AmountExtractor {
    pub fn new() -> RiskResult<Self> {
        let pattern = Regex::new(AMOUNT_PATTERN)
            .map_err(|e| RiskError::Config(format!("amount pattern: {e}")))?;
        Ok(Self { pattern })
    }

    /// Extracts the amount (and event id, when available) from a raw value.
    pub fn extract(&self, raw: &str) -> RiskResult<ParsedTransaction> {
        let record = Record::from_json_str(raw).ok();

        let amount = match record.as_ref().and_then(amount_from_record) {
            Some(amount) => amount,
            None => self.scan(raw)?,
        };
        let event_id = record.as_ref().and_then(event_id_from_record);

        Ok(ParsedTransaction {
            amount,
            event_id,
            record,
        })
    }

    fn scan(&self, raw: &str) -> RiskResult<f64> {
        let captured = self
            .pattern
            .captures(raw)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
            .ok_or_else(|| RiskError::StreamParse("no amount field found".to_string()))?;

        parse_decimal(captured.as_str()).ok_or_else(|| {
            RiskError::StreamParse(format!("amount is not a finite number: {}", captured.as_str()))
        })
    }
}

/// Reads the top-level `amount` of a record.
pub fn amount_from_record(record: &Record) -> Option<f64> {
    match record.get(AMOUNT_FIELD)? {
        RecordValue::Number(n) => n.as_f64().filter(|a| a.is_finite()),
        RecordValue::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// Reads the first present id field of a record.
pub fn event_id_from_record(record: &Record) -> Option<String> {
    EVENT_ID_FIELDS.iter().find_map(|field| match record.get(field)? {
        RecordValue::String(s) if !s.is_empty() => Some(s.clone()),
        RecordValue::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn parse_decimal(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|a| a.is_finite())
}
