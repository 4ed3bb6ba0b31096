//! Filter error output formatting.

use grid_filter_rs::filter::FilterError;
use owo_colors::OwoColorize;

use super::helpers::caret_line;

/// Formats a filter error against the expression it came from.
///
/// Errors that carry a position get the expression echoed with a caret under
/// the offending character; the rest are the message alone.
pub fn format_expression_error(input: &str, error: &FilterError, use_colors: bool) -> String {
    let pointer = format_error_pointer(input, error, use_colors).unwrap_or_default();
    format!("{pointer}{error}\n")
}

/// The echoed expression and caret line for a positioned error.
pub fn format_error_pointer(input: &str, error: &FilterError, use_colors: bool) -> Option<String> {
    let caret = caret_line(input, error.position()?);
    if use_colors {
        Some(format!("  {input}\n  {}\n", caret.red().bold()))
    } else {
        Some(format!("  {input}\n  {caret}\n"))
    }
}
