//! Filter command implementation.
//!
//! Composes a quick filter, an expression and column filters, then sorts and
//! pages the matching records.

use std::path::Path;

use grid_filter_rs::filter::{CompiledFilter, ErrorPolicy, FilterConfig, FilterError};
use grid_filter_rs::FieldRegistry;
use grid_state_rs::{Grid, GridOptions, SortConfig, SortDirection};

use super::config::Config;
use super::{load_catalog, load_records, parse_condition, CommandContext, CommandError, Result};
use crate::output::{format_error_pointer, format_page_json, format_page_table};

/// Options for the filter command.
pub struct FilterOptions<'a> {
    pub catalog: &'a Path,
    pub records: &'a Path,
    pub quick: Option<&'a str>,
    pub expr: Option<&'a str>,
    pub columns: &'a [String],
    pub sort: Option<&'a str>,
    pub desc: bool,
    pub page: usize,
    pub page_size: Option<usize>,
    pub fail_closed: bool,
}

impl FilterOptions<'_> {
    /// The filter configuration described by the flags.
    pub fn filter_config(&self) -> Result<FilterConfig> {
        let mut config = FilterConfig::new()
            .with_quick_filter(self.quick.unwrap_or_default())
            .with_expression(self.expr.unwrap_or_default());
        for raw in self.columns {
            config = config.with_column_filter(parse_condition(raw)?);
        }
        Ok(config)
    }

    /// Grid options from the config file with the command-line overrides applied.
    pub fn grid_options(&self, config: &Config) -> GridOptions {
        let mut options = config.grid_options();
        if let Some(page_size) = self.page_size {
            options.page_size = page_size;
        }
        if self.fail_closed {
            options.compose.error_policy = ErrorPolicy::FailClosed;
        }
        options
    }

    /// The requested sort, checked against the catalog.
    pub fn sort_config(&self, registry: &FieldRegistry) -> Result<SortConfig> {
        let Some(key) = self.sort else {
            return Ok(SortConfig::none());
        };
        if !registry.contains(key) {
            return Err(FilterError::UnknownField {
                name: key.to_string(),
                position: None,
                suggestion: registry.suggest(key),
            }
            .into());
        }
        let direction = if self.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        Ok(SortConfig::by(key, direction))
    }
}

/// Builds a grid positioned on the requested page, with the filter and sort applied.
pub fn build_grid(opts: &FilterOptions<'_>, config: &Config, registry: FieldRegistry) -> Result<Grid> {
    let sort = opts.sort_config(&registry)?;
    let mut grid = Grid::with_options(registry, opts.grid_options(config));
    grid.set_filter(opts.filter_config()?)?;
    grid.set_sort(sort);
    grid.set_page(opts.page);
    Ok(grid)
}

/// Executes the filter command.
pub fn execute(ctx: &CommandContext, config: &Config, opts: &FilterOptions<'_>) -> Result<()> {
    let registry = load_catalog(opts.catalog)?;
    let records = load_records(opts.records)?;

    let grid = match build_grid(opts, config, registry) {
        Ok(grid) => grid,
        Err(e) => {
            report_pointer(ctx, opts.expr, &e);
            return Err(e);
        }
    };

    let page = grid.query(&records);
    let evaluation_errors = grid.compiled_filter().map_or(0, CompiledFilter::error_count);

    if ctx.json_output {
        println!("{}", format_page_json(&page, evaluation_errors)?);
    } else if !ctx.quiet {
        print!("{}", format_page_table(&page, grid.registry(), ctx.use_colors));
        if let Some(filter) = grid.compiled_filter().filter(|f| f.error_count() > 0) {
            eprintln!(
                "{} record(s) could not be evaluated ({})",
                filter.error_count(),
                filter.error_policy()
            );
        }
    }

    Ok(())
}

/// Points at the failing spot of the expression, when the error carries one.
fn report_pointer(ctx: &CommandContext, expr: Option<&str>, error: &CommandError) {
    if ctx.json_output || ctx.quiet {
        return;
    }
    let (Some(expr), Some(filter_error)) = (expr, error.filter_error()) else {
        return;
    };
    if let Some(pointer) = format_error_pointer(expr, filter_error, ctx.use_colors) {
        eprint!("{pointer}");
    }
}
