//! Serializable filter state: column filter conditions and the grid's filter configuration.

use serde::{Deserialize, Serialize};

use super::operator::FilterOperator;

/// One structured, single-field column filter.
///
/// Serializes as `{"field": ..., "condition": {"operator": ..., "value": ..., "value2": ...}}`.
/// The flat form `{"field", "operator", "value", "value2"}` is also accepted
/// when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ConditionRepr", into = "ConditionRepr")]
pub struct FilterCondition {
    /// The field key the condition applies to.
    pub field: String,
    /// The comparison operator.
    pub operator: FilterOperator,
    /// The operand (lower bound for `between`).
    pub value: serde_json::Value,
    /// The upper bound for `between`.
    pub value2: Option<serde_json::Value>,
}

impl FilterCondition {
    /// Creates a single-operand condition.
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            value2: None,
        }
    }

    /// Creates an inclusive `between` condition.
    pub fn between(
        field: impl Into<String>,
        low: impl Into<serde_json::Value>,
        high: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::Between,
            value: low.into(),
            value2: Some(high.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConditionBody {
    operator: FilterOperator,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value2: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ConditionRepr {
    Nested {
        field: String,
        condition: ConditionBody,
    },
    Flat {
        field: String,
        #[serde(flatten)]
        condition: ConditionBody,
    },
}

impl From<ConditionRepr> for FilterCondition {
    fn from(repr: ConditionRepr) -> Self {
        let (field, body) = match repr {
            ConditionRepr::Nested { field, condition } => (field, condition),
            ConditionRepr::Flat { field, condition } => (field, condition),
        };
        Self {
            field,
            operator: body.operator,
            value: body.value,
            value2: body.value2,
        }
    }
}

impl From<FilterCondition> for ConditionRepr {
    fn from(condition: FilterCondition) -> Self {
        ConditionRepr::Nested {
            field: condition.field,
            condition: ConditionBody {
                operator: condition.operator,
                value: condition.value,
                value2: condition.value2,
            },
        }
    }
}

/// The complete filter state of a grid.
///
/// A value type: grids replace it wholesale on every change, which is what
/// makes undo/redo a matter of swapping snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    /// Case-insensitive substring matched against the quick-filter fields.
    pub quick_filter: String,
    /// Advanced expression in the filter language.
    pub expression: String,
    /// Structured column filters.
    pub column_filters: Vec<FilterCondition>,
}

impl FilterConfig {
    /// Creates an empty configuration that matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with the quick filter replaced.
    pub fn with_quick_filter(mut self, quick_filter: impl Into<String>) -> Self {
        self.quick_filter = quick_filter.into();
        self
    }

    /// Returns a copy with the expression replaced.
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = expression.into();
        self
    }

    /// Returns a copy with a column filter appended.
    pub fn with_column_filter(mut self, condition: FilterCondition) -> Self {
        self.column_filters.push(condition);
        self
    }

    /// Returns true if no filter of any category is set.
    pub fn is_empty(&self) -> bool {
        self.quick_filter.trim().is_empty()
            && self.expression.trim().is_empty()
            && self.column_filters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_config_serializes_to_wire_shape() {
        let config = FilterConfig::new()
            .with_quick_filter("foo")
            .with_expression("age > 10")
            .with_column_filter(FilterCondition::new("age", FilterOperator::Lte, 50))
            .with_column_filter(FilterCondition::between("score", 1, 5));

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json,
            json!({
                "quickFilter": "foo",
                "expression": "age > 10",
                "columnFilters": [
                    {"field": "age", "condition": {"operator": "lte", "value": 50}},
                    {"field": "score", "condition": {"operator": "between", "value": 1, "value2": 5}}
                ]
            })
        );
    }

    #[test]
    fn test_filter_config_roundtrip() {
        let config = FilterConfig::new()
            .with_expression("name contains \"x\"")
            .with_column_filter(FilterCondition::new("name", FilterOperator::StartsWith, "ab"));
        let text = serde_json::to_string(&config).unwrap();
        let back: FilterConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_condition_accepts_flat_shape() {
        let condition: FilterCondition =
            serde_json::from_value(json!({"field": "age", "operator": ">", "value": 3})).unwrap();
        assert_eq!(condition, FilterCondition::new("age", FilterOperator::Gt, 3));
    }

    #[test]
    fn test_condition_keeps_unknown_operator() {
        let condition: FilterCondition = serde_json::from_value(
            json!({"field": "age", "condition": {"operator": "approx", "value": 3}}),
        )
        .unwrap();
        assert_eq!(
            condition.operator,
            FilterOperator::Unknown("approx".to_string())
        );
    }

    #[test]
    fn test_missing_keys_default() {
        let config: FilterConfig = serde_json::from_str(r#"{"expression": "a = 1"}"#).unwrap();
        assert_eq!(config.quick_filter, "");
        assert!(config.column_filters.is_empty());
        assert!(!config.is_empty());
        assert!(FilterConfig::new().with_quick_filter("   ").is_empty());
    }
}
