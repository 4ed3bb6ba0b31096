//! Common helper functions for output formatting.

use owo_colors::OwoColorize;

/// Widest a table cell may get before it is truncated.
pub const MAX_CELL_WIDTH: usize = 30;

/// Truncates a string to a maximum number of characters.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}

/// Renders a record attribute for a table cell. Missing and null render empty.
pub fn format_cell(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Pads a cell to `width` characters.
pub fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - len))
    }
}

/// Renders a table header row.
pub fn format_header(header: &str, use_colors: bool) -> String {
    if use_colors {
        format!("{}\n", header.dimmed())
    } else {
        format!("{header}\n")
    }
}

/// Builds the line that points at `position` (a byte offset) in `input`.
pub fn caret_line(input: &str, position: usize) -> String {
    let column = input
        .get(..position)
        .map(|prefix| prefix.chars().count())
        .unwrap_or_else(|| input.chars().count());
    format!("{}^", " ".repeat(column))
}
