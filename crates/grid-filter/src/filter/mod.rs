//! Filter expression parser, evaluator and composer for data grids.
//!
//! This module parses the advanced-filter language typed by users, checks it
//! against a [`FieldRegistry`](crate::field::FieldRegistry), and combines it
//! with quick filters and column filters into one record predicate.
//!
//! # Supported Syntax
//!
//! ## Comparisons
//! - `=`, `==` - Loose equality
//! - `===`, `!==` - Strict equality / inequality
//! - `!=` - Loose inequality
//! - `>`, `<`, `>=`, `<=` - Ordering (number and date fields)
//! - `contains`, `startsWith`, `endsWith` - Case-insensitive text matching
//!
//! ## Operands
//! - `qualityFraction` - A field from the catalog
//! - `0.8`, `-3`, `true` - Literals, coerced to the compared field's type
//! - `"two words"`, `'x'` - Quoted strings
//! - `len(name)` - Calls to host-registered functions
//!
//! ## Boolean Operators
//! - `&&` - AND
//! - `||` - OR
//! - `!` - NOT
//! - `()` - Grouping
//!
//! # Example
//!
//! ```
//! use grid_filter_rs::field::{FieldRegistry, FieldType, FilterField};
//! use grid_filter_rs::filter::{FilterError, FilterParser};
//!
//! let fields = FieldRegistry::new([
//!     FilterField::new("status", FieldType::String),
//!     FilterField::new("interruptions", FieldType::Number),
//! ]);
//!
//! let expr = FilterParser::parse("status = active && interruptions <= 2", &fields).unwrap();
//! assert_eq!(expr.to_string(), r#"(status == "active" && interruptions <= 2)"#);
//!
//! let err = FilterParser::parse("status > 3", &fields).unwrap_err();
//! assert!(matches!(err, FilterError::TypeMismatch { .. }));
//! ```

mod ast;
mod coerce;
mod composer;
mod config;
mod error;
mod evaluator;
mod lexer;
mod operator;
mod parser;
mod validator;

pub use ast::{BinaryOperator, Expr, UnaryOperator};
pub use coerce::{coerce, coerce_json};
pub use composer::{
    build_predicate, CompiledFilter, ComposeOptions, ErrorCallback, ErrorPolicy, FilterComposer,
};
pub use config::{FilterCondition, FilterConfig};
pub use error::{FilterError, FilterResult};
pub use evaluator::{evaluate, EvalContext, FilterEvaluator, Function, FunctionTable};
pub use lexer::{CompareOp, FilterToken, Lexer, LexerError, LexerResult, PositionedToken};
pub use operator::FilterOperator;
pub use parser::FilterParser;
pub use validator::{validate, validate_against, validate_all};

#[cfg(test)]
mod evaluator_tests;
#[cfg(test)]
mod tests;
