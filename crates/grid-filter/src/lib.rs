//! Filter expression engine for tabular data grids.
//!
//! This crate turns the three kinds of filter a grid user can set (a quick
//! search box, an advanced expression and structured column filters) into a
//! single predicate over records.
//!
//! - [`field`] declares which attributes can be filtered, and with what type.
//! - [`value`] defines runtime values and how they compare.
//! - [`filter`] holds the expression language, validation and composition.

pub mod field;
pub mod filter;
pub mod value;

pub use field::{FieldRegistry, FieldType, FilterField};
pub use filter::{
    CompiledFilter, ErrorPolicy, FilterComposer, FilterCondition, FilterConfig, FilterError,
    FilterOperator, FilterParser, FilterResult,
};
pub use value::{Record, Value};
