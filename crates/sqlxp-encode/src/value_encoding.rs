//! Value normalization shared by all encoders
//!
//! Drivers deliver cells as [`sqlxp_core::Value`]. Before a cell reaches an
//! output document it is reduced to a [`CanonicalValue`]: null, text,
//! integer, float, or a fallback that keeps the original value for generic
//! rendering. CSV then turns every canonical value into a string, while the
//! JSON encoders serialize it with its natural JSON type.

use serde::{Serialize, Serializer};
use sqlxp_core::{Value, serialize_finite};

/// Literal written to CSV for SQL NULL
pub const CSV_NULL: &str = "NULL";

/// A normalized, format-agnostic cell
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    /// Any other driver type, rendered generically
    Fallback(Value),
}

/// Normalize one raw cell. Never fails.
pub fn normalize(value: Value) -> CanonicalValue {
    match value {
        Value::Null => CanonicalValue::Null,
        Value::Bytes(bytes) => CanonicalValue::Text(bytes_to_text(bytes)),
        Value::String(text) => CanonicalValue::Text(text),
        Value::Int64(v) => CanonicalValue::Integer(v),
        Value::Float64(v) => CanonicalValue::Float(v),
        other => CanonicalValue::Fallback(other),
    }
}

// Rust strings must be UTF-8; invalid sequences become U+FFFD.
fn bytes_to_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}

/// Shortest decimal text that parses back to the same `f64`, never in
/// exponent notation.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value.is_sign_positive() { '+' } else { '-' };
        format!("{sign}Inf")
    } else {
        value.to_string()
    }
}

impl CanonicalValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CanonicalValue::Null)
    }

    /// Render as a CSV field
    pub fn into_csv_field(self) -> String {
        match self {
            CanonicalValue::Null => CSV_NULL.to_string(),
            CanonicalValue::Text(text) => text,
            CanonicalValue::Integer(v) => v.to_string(),
            CanonicalValue::Float(v) => format_float(v),
            CanonicalValue::Fallback(value) => value.to_string(),
        }
    }
}

impl From<Value> for CanonicalValue {
    fn from(value: Value) -> Self {
        normalize(value)
    }
}

impl Serialize for CanonicalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CanonicalValue::Null => serializer.serialize_unit(),
            CanonicalValue::Text(text) => serializer.serialize_str(text),
            CanonicalValue::Integer(v) => serializer.serialize_i64(*v),
            CanonicalValue::Float(v) => serialize_finite(*v, serializer),
            CanonicalValue::Fallback(value) => value.serialize(serializer),
        }
    }
}
