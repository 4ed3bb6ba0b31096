//! Tree-walking evaluation of filter expressions against records.
//!
//! This module provides [`evaluate`] for computing the value of an [`Expr`]
//! and [`FilterEvaluator`] for using a parsed expression as a record predicate.
//!
//! # Example
//!
//! ```
//! use grid_filter_rs::field::{FieldRegistry, FieldType, FilterField};
//! use grid_filter_rs::filter::{FilterEvaluator, FilterParser};
//! use serde_json::json;
//!
//! let fields = FieldRegistry::new([
//!     FilterField::new("qualityFraction", FieldType::Number),
//!     FilterField::new("interruptions", FieldType::Number),
//! ]);
//! let expr = FilterParser::parse("qualityFraction > 0.8 && interruptions < 3", &fields).unwrap();
//! let evaluator = FilterEvaluator::new(&expr).with_registry(&fields);
//!
//! let good = json!({"qualityFraction": 0.85, "interruptions": 1});
//! let noisy = json!({"qualityFraction": 0.85, "interruptions": 4});
//! assert!(evaluator.matches(&good).unwrap());
//! assert!(!evaluator.matches(&noisy).unwrap());
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::field::FieldRegistry;
use crate::value::{compare, loose_eq, strict_eq, Record, Value};

use super::ast::{BinaryOperator, Expr, UnaryOperator};
use super::error::{FilterError, FilterResult};

/// A host function callable from an expression.
pub type Function = Arc<dyn Fn(&[Value]) -> FilterResult<Value> + Send + Sync>;

/// The functions an expression may call.
///
/// Nothing is callable unless it was registered here explicitly.
#[derive(Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, Function>,
}

impl FunctionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&[Value]) -> FilterResult<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    /// Returns the function registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Returns true if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FunctionTable").field("functions", &names).finish()
    }
}

/// Everything an expression can see while it is evaluated.
///
/// Identifiers resolve against the record; values are conformed to the
/// catalog's declared types when a registry is attached. Calls resolve only
/// against the attached [`FunctionTable`].
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    record: &'a dyn Record,
    functions: Option<&'a FunctionTable>,
    registry: Option<&'a FieldRegistry>,
}

impl<'a> EvalContext<'a> {
    /// Creates a context over a record, with no functions and no catalog.
    pub fn new(record: &'a dyn Record) -> Self {
        Self {
            record,
            functions: None,
            registry: None,
        }
    }

    /// Makes the functions in `functions` callable.
    pub fn with_functions(mut self, functions: &'a FunctionTable) -> Self {
        self.functions = Some(functions);
        self
    }

    /// Conforms record values to the catalog's declared types.
    pub fn with_registry(mut self, registry: &'a FieldRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Resolves an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnknownField`] if the record has no such attribute.
    pub fn lookup(&self, name: &str) -> FilterResult<Value> {
        let Some(value) = self.record.field(name) else {
            return Err(FilterError::UnknownField {
                name: name.to_string(),
                position: None,
                suggestion: self.registry.and_then(|r| r.suggest(name)),
            });
        };
        Ok(match self.registry.and_then(|r| r.field_type(name)) {
            Some(field_type) => value.conform(field_type),
            None => value,
        })
    }

    /// Resolves a callee.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnsupportedCall`] if no function is registered
    /// under `name`.
    pub fn function(&self, name: &str) -> FilterResult<&'a Function> {
        self.functions
            .and_then(|table| table.get(name))
            .ok_or_else(|| FilterError::unsupported_call(name))
    }
}

/// Evaluates an expression in a context.
///
/// `&&` and `||` short-circuit and always produce a boolean.
///
/// # Errors
///
/// - [`FilterError::UnknownField`] for identifiers missing from the record.
/// - [`FilterError::UnsupportedCall`] for callees not in the function table.
/// - [`FilterError::TypeMismatch`] for orderings between incomparable types.
/// - Any error returned by a called function.
pub fn evaluate(expr: &Expr, context: &EvalContext<'_>) -> FilterResult<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Identifier(name) => context.lookup(name),
        Expr::Unary { operator, argument } => {
            let value = evaluate(argument, context)?;
            Ok(match operator {
                UnaryOperator::Not => Value::Bool(!value.is_truthy()),
                UnaryOperator::Minus => Value::Number(-value.to_number()),
                UnaryOperator::Plus => Value::Number(value.to_number()),
            })
        }
        Expr::Binary {
            operator,
            left,
            right,
        } => evaluate_binary(*operator, left, right, context),
        Expr::Call { callee, arguments } => {
            let function = context.function(callee)?;
            let args = arguments
                .iter()
                .map(|arg| evaluate(arg, context))
                .collect::<FilterResult<Vec<_>>>()?;
            (**function)(&args)
        }
    }
}

fn evaluate_binary(
    operator: BinaryOperator,
    left: &Expr,
    right: &Expr,
    context: &EvalContext<'_>,
) -> FilterResult<Value> {
    // Logical operators short-circuit
    match operator {
        BinaryOperator::And => {
            let result = evaluate(left, context)?.is_truthy() && evaluate(right, context)?.is_truthy();
            return Ok(Value::Bool(result));
        }
        BinaryOperator::Or => {
            let result = evaluate(left, context)?.is_truthy() || evaluate(right, context)?.is_truthy();
            return Ok(Value::Bool(result));
        }
        _ => {}
    }

    let l = evaluate(left, context)?;
    let r = evaluate(right, context)?;

    let value = match operator {
        BinaryOperator::Add => Value::Number(l.to_number() + r.to_number()),
        BinaryOperator::Subtract => Value::Number(l.to_number() - r.to_number()),
        BinaryOperator::Multiply => Value::Number(l.to_number() * r.to_number()),
        BinaryOperator::Divide => Value::Number(l.to_number() / r.to_number()),

        BinaryOperator::Eq => Value::Bool(loose_eq(&l, &r)),
        BinaryOperator::StrictEq => Value::Bool(strict_eq(&l, &r)),
        BinaryOperator::NotEq => Value::Bool(!loose_eq(&l, &r)),
        BinaryOperator::StrictNotEq => Value::Bool(!strict_eq(&l, &r)),

        BinaryOperator::Gt => Value::Bool(compare(&l, &r)? == Some(Ordering::Greater)),
        BinaryOperator::Lt => Value::Bool(compare(&l, &r)? == Some(Ordering::Less)),
        BinaryOperator::Gte => Value::Bool(matches!(
            compare(&l, &r)?,
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOperator::Lte => Value::Bool(matches!(
            compare(&l, &r)?,
            Some(Ordering::Less | Ordering::Equal)
        )),

        BinaryOperator::Contains => Value::Bool(text_match(&l, &r, |h, n| h.contains(n))),
        BinaryOperator::StartsWith => Value::Bool(text_match(&l, &r, |h, n| h.starts_with(n))),
        BinaryOperator::EndsWith => Value::Bool(text_match(&l, &r, |h, n| h.ends_with(n))),

        BinaryOperator::And => Value::Bool(l.is_truthy() && r.is_truthy()),
        BinaryOperator::Or => Value::Bool(l.is_truthy() || r.is_truthy()),
    };

    Ok(value)
}

/// Case-insensitive text comparison; `null` on either side never matches.
pub(crate) fn text_match(haystack: &Value, needle: &Value, op: impl Fn(&str, &str) -> bool) -> bool {
    if matches!(haystack, Value::Null) || matches!(needle, Value::Null) {
        return false;
    }
    op(
        &haystack.to_string().to_lowercase(),
        &needle.to_string().to_lowercase(),
    )
}

/// Evaluates a parsed expression as a predicate over records.
///
/// The evaluator borrows the expression and optional function table and
/// catalog, so one parse can be reused for every record.
#[derive(Debug, Clone, Copy)]
pub struct FilterEvaluator<'a> {
    expr: &'a Expr,
    functions: Option<&'a FunctionTable>,
    registry: Option<&'a FieldRegistry>,
}

impl<'a> FilterEvaluator<'a> {
    /// Creates a new evaluator for `expr`.
    pub fn new(expr: &'a Expr) -> Self {
        Self {
            expr,
            functions: None,
            registry: None,
        }
    }

    /// Makes the functions in `functions` callable from the expression.
    pub fn with_functions(mut self, functions: &'a FunctionTable) -> Self {
        self.functions = Some(functions);
        self
    }

    /// Conforms record values to the catalog's declared types.
    pub fn with_registry(mut self, registry: &'a FieldRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Returns the truthiness of the expression for `record`.
    ///
    /// # Errors
    ///
    /// Propagates any evaluation error; see [`evaluate`].
    pub fn matches<R: Record>(&self, record: &R) -> FilterResult<bool> {
        let mut context = EvalContext::new(record);
        if let Some(functions) = self.functions {
            context = context.with_functions(functions);
        }
        if let Some(registry) = self.registry {
            context = context.with_registry(registry);
        }
        Ok(evaluate(self.expr, &context)?.is_truthy())
    }
}
