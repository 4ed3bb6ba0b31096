//! Output formatting utilities for the gq CLI.
//!
//! This module provides functions for formatting data as tables or JSON.
//! It is organized into submodules by what is being printed:
//!
//! - [`fields`] - Field catalog output (fields command)
//! - [`records`] - Record pages (filter command, session `show`)
//! - [`errors`] - Filter errors with a caret under the failing position
//! - [`helpers`] - Common formatting utilities (truncation, padding, cells)

mod errors;
mod fields;
pub mod helpers;
mod records;

pub use errors::{format_error_pointer, format_expression_error};
pub use fields::{format_fields_json, format_fields_table};
pub use records::{format_page_json, format_page_table};
