//! Composition of a [`FilterConfig`] into one record predicate.
//!
//! A record passes a compiled filter only if it passes all three categories:
//! the quick filter, the expression and every column filter. Empty categories
//! pass everything. The expression is parsed once per build, never per record.
//!
//! # Example
//!
//! ```
//! use grid_filter_rs::field::{FieldRegistry, FieldType, FilterField};
//! use grid_filter_rs::filter::{FilterComposer, FilterCondition, FilterConfig, FilterOperator};
//! use serde_json::json;
//!
//! let fields = FieldRegistry::new([
//!     FilterField::new("name", FieldType::String),
//!     FilterField::new("age", FieldType::Number),
//! ]);
//! let config = FilterConfig::new()
//!     .with_quick_filter("foo")
//!     .with_expression("age > 10")
//!     .with_column_filter(FilterCondition::new("age", FilterOperator::Lte, 50));
//!
//! let filter = FilterComposer::new(&fields).build(&config).unwrap();
//! assert!(filter.matches(&json!({"name": "foobar", "age": 30})));
//! assert!(!filter.matches(&json!({"name": "foobar", "age": 60})));
//! ```

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::field::{FieldRegistry, FieldType};
use crate::value::{compare, loose_eq, strict_eq, Record, Value};

use super::ast::Expr;
use super::coerce::coerce_json;
use super::config::{FilterCondition, FilterConfig};
use super::error::{FilterError, FilterResult};
use super::evaluator::{text_match, FilterEvaluator, FunctionTable};
use super::operator::FilterOperator;
use super::parser::FilterParser;
use super::validator::validate_all;

/// Callback receiving the first evaluation error of a compiled filter.
pub type ErrorCallback = Arc<dyn Fn(&FilterError) + Send + Sync>;

/// What a record's outcome is when evaluating it fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// The record is kept.
    #[default]
    FailOpen,
    /// The record is excluded.
    FailClosed,
}

impl ErrorPolicy {
    fn outcome(self) -> bool {
        self == ErrorPolicy::FailOpen
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::FailOpen => write!(f, "fail-open"),
            ErrorPolicy::FailClosed => write!(f, "fail-closed"),
        }
    }
}

/// Options controlling how a [`FilterConfig`] is compiled.
#[derive(Debug, Clone, Default)]
pub struct ComposeOptions {
    /// Fields the quick filter searches. `None` means every string field.
    pub quick_filter_fields: Option<Vec<String>>,
    /// Outcome for records whose evaluation fails.
    pub error_policy: ErrorPolicy,
    /// Functions callable from the expression.
    pub functions: FunctionTable,
}

/// Builds [`CompiledFilter`]s against a field catalog.
pub struct FilterComposer<'a> {
    registry: &'a FieldRegistry,
    options: ComposeOptions,
    on_error: Option<ErrorCallback>,
}

impl<'a> FilterComposer<'a> {
    /// Creates a composer with default options.
    pub fn new(registry: &'a FieldRegistry) -> Self {
        Self {
            registry,
            options: ComposeOptions::default(),
            on_error: None,
        }
    }

    /// Replaces the compose options.
    pub fn with_options(mut self, options: ComposeOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the callback told about the first evaluation error of each built filter.
    pub fn on_error(mut self, callback: ErrorCallback) -> Self {
        self.on_error = Some(callback);
        self
    }

    /// Compiles a configuration into a predicate.
    ///
    /// # Errors
    ///
    /// Returns the parse error of the expression, or the validation error of
    /// the first invalid column filter. Nothing is compiled in either case.
    pub fn build(&self, config: &FilterConfig) -> FilterResult<CompiledFilter> {
        let expression = FilterParser::parse(&config.expression, self.registry)?;
        validate_all(&config.column_filters, Some(self.registry))?;

        let columns = config
            .column_filters
            .iter()
            .map(|c| ColumnPredicate::compile(c, self.registry))
            .collect::<FilterResult<Vec<_>>>()?;

        let needle = config.quick_filter.trim().to_lowercase();
        let quick = (!needle.is_empty()).then(|| QuickFilter {
            needle,
            fields: match &self.options.quick_filter_fields {
                Some(fields) => fields.clone(),
                None => self
                    .registry
                    .string_fields()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            },
        });

        tracing::debug!(
            quick = quick.is_some(),
            expression = %expression,
            columns = columns.len(),
            "compiled filter"
        );

        Ok(CompiledFilter {
            quick,
            expression: (!expression.is_always()).then_some(expression),
            columns,
            registry: self.registry.clone(),
            functions: self.options.functions.clone(),
            policy: self.options.error_policy,
            on_error: self.on_error.clone(),
            error_reported: AtomicBool::new(false),
            error_count: AtomicUsize::new(0),
        })
    }
}

/// Compiles `config` with default options.
///
/// # Errors
///
/// See [`FilterComposer::build`].
pub fn build_predicate<R: Record>(
    config: &FilterConfig,
    fields: &FieldRegistry,
) -> FilterResult<impl Fn(&R) -> bool> {
    let compiled = FilterComposer::new(fields).build(config)?;
    Ok(move |record: &R| compiled.matches(record))
}

struct QuickFilter {
    needle: String,
    fields: Vec<String>,
}

impl QuickFilter {
    fn matches(&self, record: &dyn Record) -> bool {
        self.fields.iter().any(|key| match record.field(key) {
            Some(Value::Null) | None => false,
            Some(value) => value.to_string().to_lowercase().contains(&self.needle),
        })
    }
}

/// A column filter with its operands converted to the field's type.
struct ColumnPredicate {
    field: String,
    field_type: FieldType,
    operator: FilterOperator,
    value: Value,
    value2: Option<Value>,
}

impl ColumnPredicate {
    fn compile(condition: &FilterCondition, registry: &FieldRegistry) -> FilterResult<Self> {
        let field_type = registry
            .field_type(&condition.field)
            .ok_or_else(|| FilterError::unknown_field(&condition.field))?;
        let value2 = match &condition.value2 {
            Some(v) => Some(coerce_json(v, field_type)?),
            None => None,
        };
        Ok(Self {
            field: condition.field.clone(),
            field_type,
            operator: condition.operator.clone(),
            value: coerce_json(&condition.value, field_type)?,
            value2,
        })
    }

    fn matches(&self, record: &dyn Record) -> FilterResult<bool> {
        let actual = record
            .field(&self.field)
            .ok_or_else(|| FilterError::unknown_field(&self.field))?
            .conform(self.field_type);
        let expected = &self.value;

        let ordering = |value: &Value| compare(&actual, value);

        Ok(match &self.operator {
            FilterOperator::Equals => self.equals(&actual),
            FilterOperator::NotEquals => !self.equals(&actual),
            FilterOperator::Contains => text_match(&actual, expected, |h, n| h.contains(n)),
            FilterOperator::StartsWith => text_match(&actual, expected, |h, n| h.starts_with(n)),
            FilterOperator::EndsWith => text_match(&actual, expected, |h, n| h.ends_with(n)),
            FilterOperator::Gt => ordering(expected)? == Some(CmpOrdering::Greater),
            FilterOperator::Lt => ordering(expected)? == Some(CmpOrdering::Less),
            FilterOperator::Gte => matches!(
                ordering(expected)?,
                Some(CmpOrdering::Greater | CmpOrdering::Equal)
            ),
            FilterOperator::Lte => matches!(
                ordering(expected)?,
                Some(CmpOrdering::Less | CmpOrdering::Equal)
            ),
            FilterOperator::Between => {
                let Some(high) = &self.value2 else {
                    return Ok(false);
                };
                matches!(
                    ordering(expected)?,
                    Some(CmpOrdering::Greater | CmpOrdering::Equal)
                ) && matches!(
                    ordering(high)?,
                    Some(CmpOrdering::Less | CmpOrdering::Equal)
                )
            }
            FilterOperator::Unknown(name) => {
                return Err(FilterError::validation(
                    &self.field,
                    format!("unknown operator '{name}'"),
                ))
            }
        })
    }

    /// String fields compare exactly; other types use loose equality.
    fn equals(&self, actual: &Value) -> bool {
        match self.field_type {
            FieldType::String => strict_eq(actual, &self.value),
            _ => loose_eq(actual, &self.value),
        }
    }
}

/// A compiled [`FilterConfig`], ready to test records.
pub struct CompiledFilter {
    quick: Option<QuickFilter>,
    expression: Option<Expr>,
    columns: Vec<ColumnPredicate>,
    registry: FieldRegistry,
    functions: FunctionTable,
    policy: ErrorPolicy,
    on_error: Option<ErrorCallback>,
    error_reported: AtomicBool,
    error_count: AtomicUsize,
}

impl CompiledFilter {
    /// Returns true if `record` passes every filter category.
    ///
    /// Evaluation errors never propagate: the record's outcome follows the
    /// error policy, and the first error is logged and passed to the error
    /// callback.
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        if let Some(quick) = &self.quick {
            if !quick.matches(record) {
                return false;
            }
        }

        if let Some(expr) = &self.expression {
            let evaluator = FilterEvaluator::new(expr)
                .with_functions(&self.functions)
                .with_registry(&self.registry);
            match evaluator.matches(record) {
                Ok(true) => {}
                Ok(false) => return false,
                Err(e) => {
                    if !self.fail(e) {
                        return false;
                    }
                }
            }
        }

        self.columns.iter().all(|column| match column.matches(record) {
            Ok(matched) => matched,
            Err(e) => self.fail(e),
        })
    }

    /// Returns the records that pass, in their original order.
    pub fn filter<'r, R: Record>(&self, records: &'r [R]) -> Vec<&'r R> {
        records.iter().filter(|r| self.matches(*r)).collect()
    }

    /// Number of evaluation errors seen so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Returns the error policy this filter applies.
    pub fn error_policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Records an evaluation error and returns the record's outcome.
    fn fail(&self, error: FilterError) -> bool {
        self.error_count.fetch_add(1, Ordering::Relaxed);
        if !self.error_reported.swap(true, Ordering::Relaxed) {
            tracing::warn!(kind = error.kind(), policy = %self.policy, "filter evaluation failed: {error}");
            if let Some(callback) = &self.on_error {
                callback(&error);
            }
        }
        self.policy.outcome()
    }
}

impl fmt::Debug for CompiledFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFilter")
            .field("quick", &self.quick.as_ref().map(|q| &q.needle))
            .field("expression", &self.expression.as_ref().map(ToString::to_string))
            .field("columns", &self.columns.len())
            .field("policy", &self.policy)
            .finish()
    }
}
