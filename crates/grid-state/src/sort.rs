//! Sort configuration and the in-memory sorting and paging helpers.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use grid_filter_rs::field::FieldRegistry;
use grid_filter_rs::value::{Record, Value};
use serde::{Deserialize, Serialize};

use crate::state::FIRST_PAGE;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Returns the opposite direction.
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(format!("invalid sort direction '{other}' (expected asc or desc)")),
        }
    }
}

/// Which field the grid is sorted by, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortConfig {
    pub key: Option<String>,
    pub direction: SortDirection,
}

impl SortConfig {
    /// Sorts by `key` in `direction`.
    pub fn by(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: Some(key.into()),
            direction,
        }
    }

    /// The unsorted configuration.
    pub fn none() -> Self {
        Self::default()
    }

    /// The configuration a column-header click produces: the same key flips
    /// direction, a new key starts ascending.
    pub fn toggled(&self, key: &str) -> Self {
        match &self.key {
            Some(current) if current == key => Self::by(key, self.direction.toggled()),
            _ => Self::by(key, SortDirection::Asc),
        }
    }
}

/// Sorts records in place according to `sort`.
///
/// The sort is stable. Missing and `null` values go last in either direction,
/// and values of different types are grouped by type. With a
/// registry, values are first conformed to the field's declared type, so
/// date strings sort chronologically.
pub fn sort_records<R: Record>(records: &mut [R], sort: &SortConfig, registry: Option<&FieldRegistry>) {
    let Some(key) = sort.key.as_deref() else {
        return;
    };
    let field_type = registry.and_then(|r| r.field_type(key));
    let read = |record: &R| {
        let value = record.field(key).unwrap_or(Value::Null);
        match field_type {
            Some(t) => value.conform(t),
            None => value,
        }
    };

    records.sort_by(|a, b| {
        let (a, b) = (read(a), read(b));
        match (&a, &b) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            _ => match sort.direction {
                SortDirection::Asc => total_order(&a, &b),
                SortDirection::Desc => total_order(&a, &b).reverse(),
            },
        }
    });
}

/// A total order over non-null values: by type first, then by value.
///
/// Unlike filter comparisons, this never converts across types.
fn total_order(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::Date(_) => 3,
            Value::String(_) => 4,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Returns the slice of `items` shown on a 1-indexed `page`.
///
/// Pages past the end are empty; page `0` is treated as the first page.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let page_size = page_size.max(1);
    let start = (page.max(FIRST_PAGE) - FIRST_PAGE).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Number of pages needed for `total` items; at least one.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}
