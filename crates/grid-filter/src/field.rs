//! Field catalogs: the declared, typed attributes a record type can be filtered on.
//!
//! Field types are always declared by the caller; nothing here infers a type
//! from record data.

use std::fmt;

use serde::{Deserialize, Serialize};
use strsim::levenshtein;

/// Maximum Levenshtein distance to consider a field name as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// The value type of a filterable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text.
    String,
    /// Integer or floating point number.
    Number,
    /// `true` / `false`.
    Boolean,
    /// ISO-8601 date or date-time.
    Date,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
        };
        f.write_str(name)
    }
}

/// One filterable attribute of a record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterField {
    /// The attribute key as it appears in records and expressions.
    pub key: String,

    /// The declared value type.
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Optional display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FilterField {
    /// Creates a field without a label.
    pub fn new(key: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            field_type,
            label: None,
        }
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the label, falling back to the key.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }
}

/// The catalog of filterable fields for one record type.
///
/// Serializes as a plain JSON array of [`FilterField`]s. Keys are matched
/// case-sensitively, the same way records are keyed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldRegistry {
    fields: Vec<FilterField>,
}

impl FieldRegistry {
    /// Creates a registry from a list of fields.
    ///
    /// If a key appears more than once, the first declaration wins.
    pub fn new(fields: impl IntoIterator<Item = FilterField>) -> Self {
        let mut unique: Vec<FilterField> = Vec::new();
        for field in fields {
            if !unique.iter().any(|f| f.key == field.key) {
                unique.push(field);
            }
        }
        Self { fields: unique }
    }

    /// Returns the field with the given key.
    pub fn get(&self, key: &str) -> Option<&FilterField> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Returns the declared type of a field.
    pub fn field_type(&self, key: &str) -> Option<FieldType> {
        self.get(key).map(|f| f.field_type)
    }

    /// Returns true if the key is declared.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over all declared fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FilterField> {
        self.fields.iter()
    }

    /// Returns the keys of all `string` fields.
    pub fn string_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.field_type == FieldType::String)
            .map(|f| f.key.as_str())
            .collect()
    }

    /// Returns the number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Finds the closest declared key to `name` for "did you mean" hints.
    ///
    /// Returns `None` for exact matches and for candidates further than
    /// a small edit distance away.
    pub fn suggest(&self, name: &str) -> Option<String> {
        let query_lower = name.to_lowercase();

        let (best_match, best_distance) = self
            .fields
            .iter()
            .map(|f| (f.key.as_str(), levenshtein(&query_lower, &f.key.to_lowercase())))
            .min_by_key(|(_, d)| *d)?;

        if best_distance > 0 && best_distance <= MAX_SUGGESTION_DISTANCE {
            Some(best_match.to_string())
        } else if best_distance == 0 && best_match != name {
            // Differs only by case.
            Some(best_match.to_string())
        } else {
            None
        }
    }
}

impl FromIterator<FilterField> for FieldRegistry {
    fn from_iter<I: IntoIterator<Item = FilterField>>(iter: I) -> Self {
        Self::new(iter)
    }
}
