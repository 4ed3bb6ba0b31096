//! The single operator vocabulary shared by column filters and expressions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field::FieldType;

/// A comparison operator usable in a column filter or expression.
///
/// Column filters name operators in words (`gt`, `between`, ...), expressions
/// use symbols (`>`, `!=`, ...). Both spellings parse into this one enum, and
/// [`FilterOperator::applies_to`] is the only place operator/type
/// compatibility is decided.
///
/// Unrecognized names are kept as [`FilterOperator::Unknown`] so that a
/// deserialized condition can still be reported by the validator instead of
/// failing to load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    StartsWith,
    EndsWith,
    Gt,
    Lt,
    Gte,
    Lte,
    Between,
    Unknown(String),
}

impl FilterOperator {
    /// Every known operator, in display order.
    pub const ALL: [FilterOperator; 10] = [
        FilterOperator::Equals,
        FilterOperator::NotEquals,
        FilterOperator::Contains,
        FilterOperator::StartsWith,
        FilterOperator::EndsWith,
        FilterOperator::Gt,
        FilterOperator::Lt,
        FilterOperator::Gte,
        FilterOperator::Lte,
        FilterOperator::Between,
    ];

    /// Parses an operator from either vocabulary.
    pub fn from_name(name: &str) -> Self {
        match name {
            "equals" | "eq" | "=" | "==" => FilterOperator::Equals,
            "notEquals" | "neq" | "!=" => FilterOperator::NotEquals,
            "contains" => FilterOperator::Contains,
            "startsWith" => FilterOperator::StartsWith,
            "endsWith" => FilterOperator::EndsWith,
            "gt" | ">" => FilterOperator::Gt,
            "lt" | "<" => FilterOperator::Lt,
            "gte" | ">=" => FilterOperator::Gte,
            "lte" | "<=" => FilterOperator::Lte,
            "between" => FilterOperator::Between,
            other => FilterOperator::Unknown(other.to_string()),
        }
    }

    /// The canonical word form.
    pub fn name(&self) -> &str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::NotEquals => "notEquals",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::EndsWith => "endsWith",
            FilterOperator::Gt => "gt",
            FilterOperator::Lt => "lt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lte => "lte",
            FilterOperator::Between => "between",
            FilterOperator::Unknown(name) => name,
        }
    }

    /// Returns true for operators that order their operands.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            FilterOperator::Gt
                | FilterOperator::Lt
                | FilterOperator::Gte
                | FilterOperator::Lte
                | FilterOperator::Between
        )
    }

    /// Returns true for the case-insensitive text operators.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            FilterOperator::Contains | FilterOperator::StartsWith | FilterOperator::EndsWith
        )
    }

    /// Returns true if the operator may be applied to a field of `field_type`.
    ///
    /// | operator | string | number | boolean | date |
    /// |---|---|---|---|---|
    /// | equals / notEquals | ✓ | ✓ | ✓ | ✓ |
    /// | contains / startsWith / endsWith | ✓ | | | |
    /// | gt / lt / gte / lte / between | | ✓ | | ✓ |
    pub fn applies_to(&self, field_type: FieldType) -> bool {
        match self {
            FilterOperator::Equals | FilterOperator::NotEquals => true,
            FilterOperator::Contains | FilterOperator::StartsWith | FilterOperator::EndsWith => {
                field_type == FieldType::String
            }
            FilterOperator::Gt
            | FilterOperator::Lt
            | FilterOperator::Gte
            | FilterOperator::Lte
            | FilterOperator::Between => {
                matches!(field_type, FieldType::Number | FieldType::Date)
            }
            FilterOperator::Unknown(_) => false,
        }
    }
}

impl From<String> for FilterOperator {
    fn from(name: String) -> Self {
        FilterOperator::from_name(&name)
    }
}

impl From<FilterOperator> for String {
    fn from(op: FilterOperator) -> Self {
        op.name().to_string()
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
