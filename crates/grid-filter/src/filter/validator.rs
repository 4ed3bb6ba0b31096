//! Validation of structured column filters.
//!
//! Invalid conditions are rejected, never skipped: callers receive the error
//! and the update that carried the condition is refused as a whole.

use std::cmp::Ordering;

use crate::field::{FieldRegistry, FieldType};
use crate::value::compare;

use super::coerce::coerce_json;
use super::config::FilterCondition;
use super::error::{FilterError, FilterResult};
use super::operator::FilterOperator;

/// Returns the JSON-level type name of a value.
fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Checks a condition on its own, without a field catalog.
///
/// - the operator must be known;
/// - `between` needs a `value2` of the same JSON type as `value`;
/// - `gt`, `lt`, `gte` and `lte` need a numeric `value`.
///
/// # Errors
///
/// Returns [`FilterError::Validation`] describing the first rule that fails.
///
/// # Example
///
/// ```
/// use grid_filter_rs::filter::{validate, FilterCondition, FilterOperator};
///
/// assert!(validate(&FilterCondition::new("age", FilterOperator::Gt, "abc")).is_err());
/// assert!(validate(&FilterCondition::new("age", FilterOperator::Gt, 30)).is_ok());
/// ```
pub fn validate(condition: &FilterCondition) -> FilterResult<()> {
    check_shape(condition)?;
    check_numeric_value(condition)
}

/// Checks a condition against a field catalog.
///
/// In addition to the rules of [`validate`], the field must be declared, the
/// operator must apply to the field's type, and the value(s) must convert to
/// that type. Ordering operators on `date` fields take ISO-8601 strings, and a
/// `between` range must not be inverted.
///
/// # Errors
///
/// Returns [`FilterError::UnknownField`] for undeclared fields and
/// [`FilterError::Validation`] for every other failure.
pub fn validate_against(condition: &FilterCondition, registry: &FieldRegistry) -> FilterResult<()> {
    check_shape(condition)?;

    let Some(field_type) = registry.field_type(&condition.field) else {
        return Err(FilterError::UnknownField {
            name: condition.field.clone(),
            position: None,
            suggestion: registry.suggest(&condition.field),
        });
    };

    if field_type != FieldType::Date {
        check_numeric_value(condition)?;
    }

    if !condition.operator.applies_to(field_type) {
        return Err(FilterError::validation(
            &condition.field,
            format!(
                "operator '{}' does not apply to {} fields",
                condition.operator, field_type
            ),
        ));
    }

    let as_validation = |e: FilterError| FilterError::validation(&condition.field, e.to_string());
    let low = coerce_json(&condition.value, field_type).map_err(as_validation)?;

    if let (FilterOperator::Between, Some(value2)) = (&condition.operator, &condition.value2) {
        let high = coerce_json(value2, field_type).map_err(as_validation)?;
        if compare(&low, &high).map_err(as_validation)? == Some(Ordering::Greater) {
            return Err(FilterError::validation(
                &condition.field,
                format!("range start {low} is after range end {high}"),
            ));
        }
    }

    Ok(())
}

/// Validates every condition, stopping at the first failure.
///
/// Uses [`validate_against`] when a catalog is given and [`validate`] otherwise.
pub fn validate_all(
    conditions: &[FilterCondition],
    registry: Option<&FieldRegistry>,
) -> FilterResult<()> {
    for condition in conditions {
        match registry {
            Some(registry) => validate_against(condition, registry)?,
            None => validate(condition)?,
        }
    }
    Ok(())
}

/// Rules that hold regardless of field types.
fn check_shape(condition: &FilterCondition) -> FilterResult<()> {
    if condition.field.trim().is_empty() {
        return Err(FilterError::validation("", "field is required"));
    }

    if let FilterOperator::Unknown(name) = &condition.operator {
        return Err(FilterError::validation(
            &condition.field,
            format!("unknown operator '{name}'"),
        ));
    }

    if condition.operator == FilterOperator::Between {
        let value2 = match &condition.value2 {
            Some(v) if !v.is_null() => v,
            _ => {
                return Err(FilterError::validation(
                    &condition.field,
                    "'between' requires a second value",
                ))
            }
        };
        let (t1, t2) = (json_type(&condition.value), json_type(value2));
        if t1 != t2 {
            return Err(FilterError::validation(
                &condition.field,
                format!("'between' bounds must have the same type, got {t1} and {t2}"),
            ));
        }
    }

    Ok(())
}

/// `gt`, `lt`, `gte` and `lte` require a numeric operand.
fn check_numeric_value(condition: &FilterCondition) -> FilterResult<()> {
    let numeric_only = matches!(
        condition.operator,
        FilterOperator::Gt | FilterOperator::Lt | FilterOperator::Gte | FilterOperator::Lte
    );
    if numeric_only && !condition.value.is_number() {
        return Err(FilterError::validation(
            &condition.field,
            format!(
                "operator '{}' requires a numeric value, got {}",
                condition.operator,
                json_type(&condition.value)
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FilterField;
    use serde_json::json;

    fn registry() -> FieldRegistry {
        FieldRegistry::new([
            FilterField::new("name", FieldType::String),
            FilterField::new("age", FieldType::Number),
            FilterField::new("active", FieldType::Boolean),
            FilterField::new("startedAt", FieldType::Date),
        ])
    }

    #[test]
    fn test_rejects_non_numeric_value_for_numeric_operator() {
        let err = validate(&FilterCondition::new("age", FilterOperator::Gt, "abc")).unwrap_err();
        assert!(matches!(err, FilterError::Validation { ref field, .. } if field == "age"));
        assert!(err.to_string().contains("requires a numeric value"));
    }

    #[test]
    fn test_rejects_between_without_value2() {
        let condition = FilterCondition::new("age", FilterOperator::Between, 1);
        let err = validate(&condition).unwrap_err();
        assert!(err.to_string().contains("requires a second value"));

        let mut with_null = FilterCondition::between("age", 1, 2);
        with_null.value2 = Some(json!(null));
        assert!(validate(&with_null).is_err());
    }

    #[test]
    fn test_rejects_between_with_mixed_types() {
        let err = validate(&FilterCondition::between("age", 1, "5")).unwrap_err();
        assert!(err.to_string().contains("number and string"));
    }

    #[test]
    fn test_rejects_unknown_operator() {
        let condition = FilterCondition::new("age", FilterOperator::from_name("approx"), 1);
        let err = validate(&condition).unwrap_err();
        assert!(err.to_string().contains("unknown operator 'approx'"));
    }

    #[test]
    fn test_accepts_valid_conditions() {
        assert!(validate(&FilterCondition::new("age", FilterOperator::Lte, 50)).is_ok());
        assert!(validate(&FilterCondition::between("age", 1, 5)).is_ok());
        assert!(validate(&FilterCondition::new("name", FilterOperator::Contains, "x")).is_ok());
        assert!(validate(&FilterCondition::new("name", FilterOperator::Equals, "x")).is_ok());
    }

    #[test]
    fn test_against_rejects_unknown_field_with_suggestion() {
        let err = validate_against(&FilterCondition::new("agee", FilterOperator::Gt, 1), &registry())
            .unwrap_err();
        assert_eq!(
            err,
            FilterError::UnknownField {
                name: "agee".to_string(),
                position: None,
                suggestion: Some("age".to_string()),
            }
        );
    }

    #[test]
    fn test_against_rejects_inapplicable_operator() {
        let err = validate_against(
            &FilterCondition::new("age", FilterOperator::Contains, "1"),
            &registry(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("does not apply to number fields"));

        assert!(validate_against(
            &FilterCondition::new("active", FilterOperator::Equals, true),
            &registry()
        )
        .is_ok());
    }

    #[test]
    fn test_against_allows_date_strings_for_ordering() {
        let reg = registry();
        assert!(validate_against(
            &FilterCondition::new("startedAt", FilterOperator::Gte, "2024-01-01"),
            &reg
        )
        .is_ok());
        assert!(validate_against(
            &FilterCondition::between("startedAt", "2024-01-01", "2024-02-01"),
            &reg
        )
        .is_ok());
        assert!(validate_against(
            &FilterCondition::new("startedAt", FilterOperator::Gte, "last week"),
            &reg
        )
        .is_err());
    }

    #[test]
    fn test_against_rejects_inverted_range() {
        let err = validate_against(&FilterCondition::between("age", 10, 1), &registry()).unwrap_err();
        assert!(err.to_string().contains("is after range end"));
    }

    #[test]
    fn test_against_rejects_uncoercible_equals_value() {
        let err = validate_against(
            &FilterCondition::new("active", FilterOperator::Equals, "maybe"),
            &registry(),
        )
        .unwrap_err();
        assert!(matches!(err, FilterError::Validation { .. }));
    }

    #[test]
    fn test_validate_all_stops_at_first_failure() {
        let conditions = vec![
            FilterCondition::new("age", FilterOperator::Gt, 1),
            FilterCondition::new("age", FilterOperator::Lt, "x"),
            FilterCondition::new("nope", FilterOperator::Lt, 1),
        ];
        let err = validate_all(&conditions, None).unwrap_err();
        assert!(matches!(err, FilterError::Validation { .. }));
        let err = validate_all(&conditions[2..], Some(&registry())).unwrap_err();
        assert!(matches!(err, FilterError::UnknownField { .. }));
        assert!(validate_all(&conditions[..1], Some(&registry())).is_ok());
    }
}
