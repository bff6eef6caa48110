//! Lenient field decoders for stored records.
//!
//! Stored collections may come from older builds or from the local blob store
//! where numbers round-trip as text. These decoders accept those shapes and
//! normalize them into the typed model.

use chrono::{DateTime, NaiveDate};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// `true`/`false`, `1`/`0`, or their string forms. Anything else is `false`.
pub(crate) fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(flag) => flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => matches!(text.trim(), "true" | "1"),
        _ => false,
    })
}

/// Non-negative integer from a number or numeric string. Negatives floor at 0.
pub(crate) fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(0),
        other => number_from_value(&other)
            .map(clamp_u32)
            .ok_or_else(|| D::Error::custom(format!("expected a number, got `{other}`"))),
    }
}

/// Progress percentage clamped to `[0, 100]`.
pub(crate) fn lenient_progress<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(0),
        other => number_from_value(&other)
            .map(|n| n.round().clamp(0.0, 100.0) as u8)
            .ok_or_else(|| D::Error::custom(format!("expected progress number, got `{other}`"))),
    }
}

/// `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp.
pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_date(&text).ok_or_else(|| D::Error::custom(format!("invalid date `{text}`")))
}

/// Optional date; `null`, missing, or blank text decode to `None`.
pub(crate) fn lenient_opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => parse_date(&text)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date `{text}`"))),
    }
}

/// List of text. `null` is empty; a JSON-encoded array in a string is decoded.
pub(crate) fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(string_list_from_value(value))
}

pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|timestamp| timestamp.date_naive())
}

/// Parses a number or numeric string stored by either backend.
pub(crate) fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn string_list_from_value(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => text,
                other => other.to_string(),
            })
            .collect(),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(parsed @ Value::Array(_)) => string_list_from_value(parsed),
            _ if text.trim().is_empty() => Vec::new(),
            _ => vec![text],
        },
        _ => Vec::new(),
    }
}

fn clamp_u32(value: f64) -> u32 {
    value.trunc().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::{number_from_value, parse_date, string_list_from_value};
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn parse_date_accepts_plain_and_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(parse_date("2025-01-15"), Some(expected));
        assert_eq!(parse_date("2025-01-15T08:30:00.000Z"), Some(expected));
        assert_eq!(parse_date("15/01/2025"), None);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        assert_eq!(number_from_value(&json!("7")), Some(7.0));
        assert_eq!(number_from_value(&json!(" 12 ")), Some(12.0));
        assert_eq!(number_from_value(&json!("seven")), None);
        assert_eq!(number_from_value(&json!(true)), None);
    }

    #[test]
    fn string_lists_tolerate_encoded_and_missing_values() {
        assert_eq!(
            string_list_from_value(json!("[\"a\",\"b\"]")),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(string_list_from_value(json!(null)).is_empty());
        assert_eq!(string_list_from_value(json!([1, "x"])), vec!["1", "x"]);
    }
}
