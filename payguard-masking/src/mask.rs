use payguard_types::{Record, RecordValue};
use tracing::trace;

/// Token that replaces the hidden part of a value.
pub const MASK_TOKEN: &str = "****";

/// Number of trailing characters left visible.
pub const VISIBLE_SUFFIX: usize = 4;

/// Field-name fragments that mark a field as sensitive.
///
/// Matching is by case-insensitive substring, so `phone_country_code` or
/// `card_type` are masked too.
pub const SENSITIVE_MARKERS: [&str; 5] = ["email", "phone", "ssn", "bvn", "card"];

/// Returns true if a field with this name must be masked.
pub fn is_sensitive_field(name: &str) -> bool {
    let lower = name.to_lowercase();
    SENSITIVE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Masks a value, keeping only its last four characters.
///
/// Values of four characters or fewer are fully replaced by the mask token.
pub fn mask(value: &str) -> String {
    let len = value.chars().count();
    if len <= VISIBLE_SUFFIX {
        return MASK_TOKEN.to_string();
    }
    let suffix: String = value.chars().skip(len - VISIBLE_SUFFIX).collect();
    format!("{MASK_TOKEN}{suffix}")
}

/// Masks every non-null sensitive field of a record in place.
///
/// Returns the number of fields masked.
pub fn mask_in_place(record: &mut Record) -> usize {
    let mut masked = 0;
    for (name, value) in record.iter_mut() {
        if value.is_null() || !is_sensitive_field(name) {
            continue;
        }
        *value = RecordValue::String(mask(&value.to_string()));
        masked += 1;
    }
    trace!("masked {masked} of {} fields", record.len());
    masked
}

/// Returns a masked copy, leaving the original untouched.
pub fn masked_copy(record: &Record) -> Record {
    let mut copy = record.clone();
    mask_in_place(&mut copy);
    copy
}

/// Same rule as [`mask_in_place`] for a raw JSON object (top level only).
///
/// Strings are masked from their content, other non-null values from their
/// JSON text.
pub fn mask_json_in_place(object: &mut serde_json::Map<String, serde_json::Value>) -> usize {
    let mut masked = 0;
    for (name, value) in object.iter_mut() {
        if value.is_null() || !is_sensitive_field(name) {
            continue;
        }
        let display = match &*value {
            serde_json::Value::String(s) => mask(s),
            other => mask(&other.to_string()),
        };
        *value = serde_json::Value::String(display);
        masked += 1;
    }
    masked
}
