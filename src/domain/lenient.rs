//! Tolerant field decoders for backend payloads.
//!
//! The backend is a Python service; numbers sometimes arrive as strings,
//! integers where floats are expected, or `null`. These helpers never
//! fail on shape, they degrade to `None` / defaults instead.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Extract a finite number from a JSON value (number or numeric string).
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// `Option<f64>` field that tolerates strings, nulls and garbage.
pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number))
}

/// `f64` field that falls back to zero.
pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    opt_f64(deserializer).map(|v| v.unwrap_or(0.0))
}

/// `Option<String>` field that accepts strings, numbers, or lists of strings.
///
/// Lists are joined with `", "`.
pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }))
}

/// `String` field that falls back to empty.
pub fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    opt_text(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_accepts_numeric_strings() {
        assert_eq!(number(&json!("22,150.5")), Some(22150.5));
        assert_eq!(number(&json!(14)), Some(14.0));
        assert_eq!(number(&json!("N/A")), None);
        assert_eq!(number(&json!(null)), None);
    }

    #[test]
    fn test_number_rejects_infinity() {
        assert_eq!(number(&json!("inf")), None);
        assert_eq!(number(&json!("Infinity")), None);
    }
}
