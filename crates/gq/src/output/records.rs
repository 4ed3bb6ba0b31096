//! Record page output formatting.

use grid_filter_rs::FieldRegistry;
use grid_state_rs::GridPage;
use owo_colors::OwoColorize;
use serde::Serialize;

use super::helpers::{format_cell, format_header, pad, truncate_str, MAX_CELL_WIDTH};

/// JSON output structure for one page of records.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOutput<'a> {
    pub page: usize,
    pub page_count: usize,
    pub total_count: usize,
    pub has_more: bool,
    pub evaluation_errors: usize,
    pub rows: &'a [&'a serde_json::Value],
}

/// Formats a page of records as JSON.
pub fn format_page_json(
    page: &GridPage<'_, serde_json::Value>,
    evaluation_errors: usize,
) -> Result<String, serde_json::Error> {
    let output = PageOutput {
        page: page.page,
        page_count: page.page_count,
        total_count: page.total_count,
        has_more: page.has_more,
        evaluation_errors,
        rows: &page.rows,
    };
    serde_json::to_string_pretty(&output)
}

/// Formats a page of records as a table with one column per catalog field.
pub fn format_page_table(
    page: &GridPage<'_, serde_json::Value>,
    registry: &FieldRegistry,
    use_colors: bool,
) -> String {
    if page.rows.is_empty() {
        return format!("No matching records.\n{}", footer(page, use_colors));
    }

    let keys: Vec<&str> = registry.iter().map(|f| f.key.as_str()).collect();
    let cells: Vec<Vec<String>> = page
        .rows
        .iter()
        .map(|row| {
            keys.iter()
                .map(|key| truncate_str(&format_cell(row.get(*key)), MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = keys
        .iter()
        .enumerate()
        .map(|(i, key)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(key.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header = join_row(keys.iter().copied(), &widths);
    let mut output = format_header(&header, use_colors);
    for row in &cells {
        output.push_str(&join_row(row.iter().map(String::as_str), &widths));
        output.push('\n');
    }
    output.push_str(&footer(page, use_colors));
    output
}

fn join_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| pad(cell, *width))
        .collect();
    padded.join("  ").trim_end().to_string()
}

fn footer(page: &GridPage<'_, serde_json::Value>, use_colors: bool) -> String {
    let noun = if page.total_count == 1 { "record" } else { "records" };
    let text = format!(
        "Page {} of {} ({} {noun})",
        page.page, page.page_count, page.total_count
    );
    if use_colors {
        format!("{}\n", text.dimmed())
    } else {
        format!("{text}\n")
    }
}
