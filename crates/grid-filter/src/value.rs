//! Runtime values and the comparison rules between them.
//!
//! Every pair of value types has a defined equality and ordering behavior;
//! nothing relies on implicit coercion. The rules are:
//!
//! | left \ right | null | boolean | number | string | date |
//! |---|---|---|---|---|---|
//! | null | eq | ≠ / mismatch | ≠ / none | ≠ / none | ≠ / none |
//! | boolean | ≠ / mismatch | native | as 0/1 | as 0/1 vs number | ≠ / mismatch |
//! | number | ≠ / none | as 0/1 | native | string as number | epoch ms |
//! | string | ≠ / none | as 0/1 vs number | string as number | native | string as date |
//! | date | ≠ / none | ≠ / mismatch | epoch ms | string as date | native |
//!
//! Each cell reads "loose equality / ordering". "none" means the ordering is
//! undefined and every relational operator yields `false`; "mismatch" means
//! ordering raises [`FilterError::TypeMismatch`]. Strict equality (`===`) is
//! true only for the same type and the same value. `NaN` is unequal to
//! everything and unordered.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::field::FieldType;
use crate::filter::{FilterError, FilterResult};

/// A value produced by evaluation or read from a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent or JSON `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number; integers are stored as `f64`.
    Number(f64),
    /// A string.
    String(String),
    /// A UTC instant.
    Date(DateTime<Utc>),
}

impl Value {
    /// Returns the type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
        }
    }

    /// Truthiness used by `&&`, `||` and `!`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Date(_) => true,
        }
    }

    /// Numeric view used by arithmetic and unary `+`/`-`.
    ///
    /// Strings that are not numbers become `NaN`; the empty string is `0`.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Date(d) => d.timestamp_millis() as f64,
        }
    }

    /// Converts a JSON value without type information.
    ///
    /// Arrays and objects are kept as their JSON text.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s.clone()),
            other => Value::String(other.to_string()),
        }
    }

    /// Converts a JSON value into the JSON representation used for output.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => serde_json::Value::String(format_date(d)),
        }
    }

    /// Reinterprets a raw record value according to a declared field type.
    ///
    /// Records often carry dates and numbers as strings; this lifts them into
    /// the declared type when they parse, and leaves the value untouched
    /// otherwise.
    pub fn conform(self, field_type: FieldType) -> Self {
        match (field_type, self) {
            (FieldType::Date, Value::String(s)) => match parse_date(&s) {
                Some(d) => Value::Date(d),
                None => Value::String(s),
            },
            (FieldType::Date, Value::Number(ms)) => {
                match DateTime::<Utc>::from_timestamp_millis(ms as i64) {
                    Some(d) => Value::Date(d),
                    None => Value::Number(ms),
                }
            }
            (FieldType::Number, Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(n) if !n.is_nan() => Value::Number(n),
                _ => Value::String(s),
            },
            (FieldType::Boolean, Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(s),
            },
            (_, value) => value,
        }
    }

    /// Renders the value as expression source text that parses back to it.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => quote(s),
            Value::Date(d) => quote(&format_date(d)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str(""),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Date(d) => f.write_str(&format_date(d)),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn format_date(d: &DateTime<Utc>) -> String {
    d.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Parses an ISO-8601 date or date-time.
///
/// Accepts RFC 3339 (`2024-03-01T12:00:00Z`), a naive date-time
/// (`2024-03-01T12:00:00` or `2024-03-01 12:00:00`, taken as UTC) and a bare
/// date (`2024-03-01`, midnight UTC).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Strict equality (`===`): same type and same value.
pub fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Date(a), Value::Date(b)) => a == b,
        _ => false,
    }
}

/// Loose equality (`==`, `=`), following the table in the module docs.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    use Value::*;
    match (left, right) {
        (Null, Null) => true,
        (Null, _) | (_, Null) => false,
        (Bool(_), Date(_)) | (Date(_), Bool(_)) => false,
        (Date(a), Date(b)) => a == b,
        (Date(d), String(s)) | (String(s), Date(d)) => parse_date(s).is_some_and(|p| p == *d),
        (String(a), String(b)) => a == b,
        (Bool(a), Bool(b)) => a == b,
        // Remaining pairs mix numbers, booleans, dates and strings: compare numerically.
        (a, b) => {
            let (x, y) = (a.to_number(), b.to_number());
            !x.is_nan() && !y.is_nan() && x == y
        }
    }
}

/// Ordering used by `<`, `<=`, `>` and `>=`.
///
/// Returns `Ok(None)` when the pair has no defined order (every relational
/// operator is then false) and an error for pairs that cannot be ordered at all.
pub fn compare(left: &Value, right: &Value) -> FilterResult<Option<Ordering>> {
    use Value::*;
    let ordering = match (left, right) {
        (Null, Bool(_)) | (Bool(_), Null) => return Err(mismatch(left, right)),
        (Null, _) | (_, Null) => None,
        (Bool(_), Date(_)) | (Date(_), Bool(_)) => return Err(mismatch(left, right)),
        (Bool(a), Bool(b)) => Some(a.cmp(b)),
        (String(a), String(b)) => Some(a.cmp(b)),
        (Date(a), Date(b)) => Some(a.cmp(b)),
        (Date(d), String(s)) => parse_date(s).map(|p| d.cmp(&p)),
        (String(s), Date(d)) => parse_date(s).map(|p| p.cmp(d)),
        (a, b) => a.to_number().partial_cmp(&b.to_number()),
    };
    Ok(ordering)
}

fn mismatch(left: &Value, right: &Value) -> FilterError {
    FilterError::type_mismatch(format!(
        "cannot order {} against {}",
        left.type_name(),
        right.type_name()
    ))
}

/// Something a filter can read attributes from.
///
/// Implemented for JSON objects and plain maps so hosts can filter the rows
/// they already hold without converting them first.
pub trait Record {
    /// Returns the attribute stored under `key`, or `None` if the record has
    /// no such attribute.
    fn field(&self, key: &str) -> Option<Value>;
}

impl<T: Record + ?Sized> Record for &T {
    fn field(&self, key: &str) -> Option<Value> {
        (**self).field(key)
    }
}

impl Record for serde_json::Map<String, serde_json::Value> {
    fn field(&self, key: &str) -> Option<Value> {
        self.get(key).map(Value::from_json)
    }
}

impl Record for serde_json::Value {
    fn field(&self, key: &str) -> Option<Value> {
        self.as_object().and_then(|obj| obj.field(key))
    }
}

impl Record for HashMap<String, Value> {
    fn field(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl Record for BTreeMap<String, Value> {
    fn field(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}
