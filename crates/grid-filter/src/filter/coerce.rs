//! Type-aware conversion of raw literals into field values.

use crate::field::FieldType;
use crate::value::{parse_date, Value};

use super::error::{FilterError, FilterResult};

/// Converts raw literal text into a value of the given field type.
///
/// - `number`: parsed as a finite float.
/// - `boolean`: only `true` / `false`, case-insensitive.
/// - `date`: any ISO-8601 form accepted by [`parse_date`].
/// - `string`: the text itself, with one pair of wrapping quotes removed.
///
/// # Errors
///
/// Returns [`FilterError::Coercion`] if the text is not a valid value of the type.
pub fn coerce(raw: &str, field_type: FieldType) -> FilterResult<Value> {
    let text = strip_quotes(raw.trim());
    match field_type {
        FieldType::String => Ok(Value::String(strip_quotes(raw).to_string())),
        FieldType::Number => text
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Number)
            .ok_or_else(|| FilterError::coercion(raw, field_type)),
        FieldType::Boolean => match text.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(FilterError::coercion(raw, field_type)),
        },
        FieldType::Date => parse_date(text)
            .map(Value::Date)
            .ok_or_else(|| FilterError::coercion(raw, field_type)),
    }
}

/// Converts a JSON value from a column filter into a value of the field type.
///
/// JSON numbers and booleans are accepted as-is for their own types; strings
/// go through [`coerce`].
pub fn coerce_json(json: &serde_json::Value, field_type: FieldType) -> FilterResult<Value> {
    match (field_type, json) {
        (FieldType::Number, serde_json::Value::Number(n)) => n
            .as_f64()
            .map(Value::Number)
            .ok_or_else(|| FilterError::coercion(n.to_string(), field_type)),
        (FieldType::Boolean, serde_json::Value::Bool(b)) => Ok(Value::Bool(*b)),
        (FieldType::String, serde_json::Value::Number(n)) => Ok(Value::String(n.to_string())),
        (FieldType::String, serde_json::Value::Bool(b)) => Ok(Value::String(b.to_string())),
        (_, serde_json::Value::String(s)) => coerce(s, field_type),
        (_, other) => Err(FilterError::coercion(other.to_string(), field_type)),
    }
}

fn strip_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}
