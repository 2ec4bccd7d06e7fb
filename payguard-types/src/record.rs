//! Loosely-schematized key-value records.
//!
//! Components at the trust boundary (masking, field encryption, risk scoring)
//! operate on records whose schema they do not know statically. A [`Record`]
//! maps field names to a small tagged union; nested JSON structures are kept
//! as their compact JSON text so that no information is lost on the way
//! through.

use crate::error::{RecordError, RecordResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single field value in a [`Record`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl RecordValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RecordValue::Null)
    }

    /// Returns the string slice if this is a `String` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RecordValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric value if this is a `Number` value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RecordValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RecordValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Display form used by masking: strings render bare, numbers and booleans
/// render as their JSON text, null renders as `null`.
impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Null => f.write_str("null"),
            RecordValue::Bool(b) => write!(f, "{b}"),
            RecordValue::Number(n) => write!(f, "{n}"),
            RecordValue::String(s) => f.write_str(s),
        }
    }
}

impl From<serde_json::Value> for RecordValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RecordValue::Null,
            serde_json::Value::Bool(b) => RecordValue::Bool(b),
            serde_json::Value::Number(n) => RecordValue::Number(n),
            serde_json::Value::String(s) => RecordValue::String(s),
            // Arrays and objects are kept as compact JSON text.
            nested => RecordValue::String(nested.to_string()),
        }
    }
}

impl From<RecordValue> for serde_json::Value {
    fn from(value: RecordValue) -> Self {
        match value {
            RecordValue::Null => serde_json::Value::Null,
            RecordValue::Bool(b) => serde_json::Value::Bool(b),
            RecordValue::Number(n) => serde_json::Value::Number(n),
            RecordValue::String(s) => serde_json::Value::String(s),
        }
    }
}

impl<'de> Deserialize<'de> for RecordValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(RecordValue::from)
    }
}

impl From<&str> for RecordValue {
    fn from(value: &str) -> Self {
        RecordValue::String(value.to_string())
    }
}

impl From<String> for RecordValue {
    fn from(value: String) -> Self {
        RecordValue::String(value)
    }
}

impl From<bool> for RecordValue {
    fn from(value: bool) -> Self {
        RecordValue::Bool(value)
    }
}

impl From<i64> for RecordValue {
    fn from(value: i64) -> Self {
        RecordValue::Number(value.into())
    }
}

impl From<u64> for RecordValue {
    fn from(value: u64) -> Self {
        RecordValue::Number(value.into())
    }
}

/// Non-finite floats have no JSON representation and become `Null`.
impl From<f64> for RecordValue {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(RecordValue::Number)
            .unwrap_or(RecordValue::Null)
    }
}

impl<T: Into<RecordValue>> From<Option<T>> for RecordValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RecordValue::Null)
    }
}

/// A generic record: field name to [`RecordValue`], ordered by field name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, RecordValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object into a record.
    ///
    /// Fails with [`RecordError::NotAnObject`] when the text is valid JSON
    /// but not an object (e.g. an array or a bare number).
    pub fn from_json_str(json: &str) -> RecordResult<Self> {
        match serde_json::from_str::<serde_json::Value>(json)? {
            serde_json::Value::Object(map) => Ok(Self::from_json_object(map)),
            _ => Err(RecordError::NotAnObject),
        }
    }

    pub fn from_json_object(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter()
            .map(|(k, v)| (k, RecordValue::from(v)))
            .collect()
    }

    /// Renders the record as a compact JSON object.
    pub fn to_json_string(&self) -> RecordResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Inserts a field, returning the previous value if one was present.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<RecordValue>,
    ) -> Option<RecordValue> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&RecordValue> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut RecordValue> {
        self.fields.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<RecordValue> {
        self.fields.remove(name)
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RecordValue)> {
        self.fields.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut RecordValue)> {
        self.fields.iter_mut()
    }

    /// Field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<RecordValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, RecordValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, RecordValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_values_are_kept_as_json_text() {
        let record = Record::from_json_str(r#"{"meta":{"a":1},"tags":[1,2]}"#).unwrap();
        assert_eq!(record.get("meta").and_then(RecordValue::as_str), Some(r#"{"a":1}"#));
        assert_eq!(record.get("tags").and_then(RecordValue::as_str), Some("[1,2]"));
    }

    #[test]
    fn non_finite_float_becomes_null() {
        assert!(RecordValue::from(f64::NAN).is_null());
        assert!(RecordValue::from(f64::INFINITY).is_null());
    }

    #[test]
    fn display_forms() {
        assert_eq!(RecordValue::from("abc").to_string(), "abc");
        assert_eq!(RecordValue::from(30_i64).to_string(), "30");
        assert_eq!(RecordValue::from(true).to_string(), "true");
        assert_eq!(RecordValue::Null.to_string(), "null");
    }
}
