//! Session command implementation.
//!
//! Reads grid commands line by line and applies them to one [`Grid`], so a
//! sequence of filter edits, undos and redos can be scripted or typed.
//!
//! ```text
//! expr qualityFraction > 0.8
//! quick ada
//! undo
//! sort qualityFraction desc
//! show
//! ```

use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use grid_filter_rs::filter::{FilterCondition, FilterConfig};
use grid_state_rs::{DataSourceInfo, Grid, SortConfig, SortDirection};

use super::config::Config;
use super::{load_catalog, load_records, parse_condition, CommandContext, CommandError, Result};
use crate::output::{format_expression_error, format_page_json, format_page_table};

const HELP: &str = "\
commands:
  quick [TEXT]            set the quick filter (empty clears it)
  expr [EXPRESSION]       set the filter expression (empty clears it)
  column JSON             add a column filter condition
  clear                   clear every filter
  page N                  go to page N
  size N                  set rows per page
  sort [KEY [asc|desc]]   sort by KEY (toggles without a direction, clears without a key)
  undo | redo             walk the filter history
  show                    print the current page
  state                   print the grid state as JSON
  help                    print this message
";

/// One line of session input.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Quick(String),
    Expr(String),
    Column(FilterCondition),
    Clear,
    Page(usize),
    Size(usize),
    Sort(Option<(String, Option<SortDirection>)>),
    Undo,
    Redo,
    Show,
    State,
    Help,
}

impl FromStr for SessionCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match name.to_ascii_lowercase().as_str() {
            "quick" => SessionCommand::Quick(rest.to_string()),
            "expr" => SessionCommand::Expr(rest.to_string()),
            "column" => SessionCommand::Column(parse_condition(rest)?),
            "clear" => SessionCommand::Clear,
            "page" => SessionCommand::Page(parse_number(name, rest)?),
            "size" => SessionCommand::Size(parse_number(name, rest)?),
            "sort" => SessionCommand::Sort(parse_sort(rest)?),
            "undo" => SessionCommand::Undo,
            "redo" => SessionCommand::Redo,
            "show" => SessionCommand::Show,
            "state" => SessionCommand::State,
            "help" | "?" => SessionCommand::Help,
            other => {
                return Err(CommandError::Input(format!(
                    "unknown command '{other}' (try 'help')"
                )))
            }
        };
        Ok(command)
    }
}

fn parse_number(command: &str, raw: &str) -> Result<usize> {
    raw.parse()
        .map_err(|_| CommandError::Input(format!("'{command}' needs a number, got '{raw}'")))
}

fn parse_sort(raw: &str) -> Result<Option<(String, Option<SortDirection>)>> {
    let mut parts = raw.split_whitespace();
    let Some(key) = parts.next() else {
        return Ok(None);
    };
    let direction = parts
        .next()
        .map(SortDirection::from_str)
        .transpose()
        .map_err(CommandError::Input)?;
    if let Some(extra) = parts.next() {
        return Err(CommandError::Input(format!("unexpected '{extra}' after sort direction")));
    }
    Ok(Some((key.to_string(), direction)))
}

/// Counts of what happened during a session.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub commands: usize,
    pub failed: usize,
}

/// A grid plus the records it is applied to.
pub struct Session {
    grid: Grid,
    records: Vec<serde_json::Value>,
}

impl Session {
    pub fn new(grid: Grid, records: Vec<serde_json::Value>) -> Self {
        Self { grid, records }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Runs every command in `input`. Blank lines and `#` comments are skipped.
    ///
    /// A failing command is reported to `err` and the session carries on; a
    /// rejected filter leaves the grid as it was.
    pub fn run(
        &mut self,
        ctx: &CommandContext,
        input: impl BufRead,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> Result<SessionSummary> {
        let mut summary = SessionSummary::default();

        for (index, line) in input.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            summary.commands += 1;
            let outcome = trimmed
                .parse::<SessionCommand>()
                .and_then(|command| self.apply(ctx, command, out));
            if let Err(e) = outcome {
                summary.failed += 1;
                tracing::debug!(line = index + 1, "session command failed: {e}");
                report_error(ctx, index + 1, trimmed, &e, err)?;
            }
        }

        Ok(summary)
    }

    /// Applies one command, writing its result to `out`.
    pub fn apply(
        &mut self,
        ctx: &CommandContext,
        command: SessionCommand,
        out: &mut impl Write,
    ) -> Result<()> {
        let current = self.grid.state().filter_config.clone();
        let message = match command {
            SessionCommand::Quick(text) => self.filter(current.with_quick_filter(text))?,
            SessionCommand::Expr(expression) => self.filter(current.with_expression(expression))?,
            SessionCommand::Column(condition) => {
                self.filter(current.with_column_filter(condition))?
            }
            SessionCommand::Clear => self.filter(FilterConfig::new())?,
            SessionCommand::Page(page) => {
                self.grid.set_page(page);
                format!("page {}", self.grid.state().page)
            }
            SessionCommand::Size(size) => {
                self.grid.set_page_size(size);
                format!("page size {}", self.grid.state().page_size)
            }
            SessionCommand::Sort(None) => {
                self.grid.set_sort(SortConfig::none());
                "unsorted".to_string()
            }
            SessionCommand::Sort(Some((key, direction))) => {
                if !self.grid.registry().contains(&key) {
                    return Err(CommandError::Input(match self.grid.registry().suggest(&key) {
                        Some(s) => format!("unknown sort field '{key}', did you mean '{s}'?"),
                        None => format!("unknown sort field '{key}'"),
                    }));
                }
                match direction {
                    Some(direction) => self.grid.set_sort(SortConfig::by(key, direction)),
                    None => self.grid.toggle_sort(&key),
                }
                let sort = &self.grid.state().sort_config;
                format!(
                    "sorted by {} {}",
                    sort.key.as_deref().unwrap_or_default(),
                    sort.direction
                )
            }
            SessionCommand::Undo => self.walk(Grid::undo, "nothing to undo"),
            SessionCommand::Redo => self.walk(Grid::redo, "nothing to redo"),
            SessionCommand::Show => {
                let page = self.grid.query(&self.records);
                if ctx.json_output {
                    let errors = self.grid.compiled_filter().map_or(0, |f| f.error_count());
                    writeln!(out, "{}", format_page_json(&page, errors)?)?;
                } else {
                    write!(
                        out,
                        "{}",
                        format_page_table(&page, self.grid.registry(), ctx.use_colors)
                    )?;
                }
                return Ok(());
            }
            SessionCommand::State => {
                let total = self.grid.query(&self.records).total_count;
                let view = self.grid.view(DataSourceInfo {
                    total_count: Some(total),
                    has_more: false,
                });
                writeln!(out, "{}", serde_json::to_string_pretty(&view)?)?;
                return Ok(());
            }
            SessionCommand::Help => {
                write!(out, "{HELP}")?;
                return Ok(());
            }
        };

        if !ctx.quiet && !ctx.json_output {
            writeln!(out, "{message}")?;
        }
        Ok(())
    }

    fn filter(&mut self, config: FilterConfig) -> Result<String> {
        if !self.grid.set_filter(config)? {
            return Ok("filter unchanged".to_string());
        }
        Ok(format!("filter applied {}", self.position()))
    }

    fn walk(&mut self, step: fn(&mut Grid) -> bool, at_end: &str) -> String {
        if step(&mut self.grid) {
            let config = &self.grid.state().filter_config;
            let described = if config.is_empty() {
                "(no filter)".to_string()
            } else {
                describe(config)
            };
            format!("{described} {}", self.position())
        } else {
            at_end.to_string()
        }
    }

    fn position(&self) -> String {
        let history = self.grid.history();
        format!("[{}/{}]", history.index() + 1, history.len())
    }
}

/// A one-line summary of a filter configuration.
fn describe(config: &FilterConfig) -> String {
    let mut parts = Vec::new();
    if !config.quick_filter.trim().is_empty() {
        parts.push(format!("quick '{}'", config.quick_filter.trim()));
    }
    if !config.expression.trim().is_empty() {
        parts.push(format!("expr '{}'", config.expression.trim()));
    }
    if !config.column_filters.is_empty() {
        parts.push(format!("{} column filter(s)", config.column_filters.len()));
    }
    parts.join(", ")
}

fn report_error(
    ctx: &CommandContext,
    line: usize,
    input: &str,
    error: &CommandError,
    err: &mut impl Write,
) -> Result<()> {
    if ctx.json_output {
        let output = serde_json::json!({
            "error": {
                "line": line,
                "code": super::error_code(error),
                "message": error.to_string(),
            }
        });
        writeln!(err, "{output}")?;
        return Ok(());
    }

    // Positions in expression errors are relative to the expression text
    let expression = input
        .split_once(char::is_whitespace)
        .filter(|(name, _)| name.eq_ignore_ascii_case("expr"))
        .map(|(_, rest)| rest.trim());
    match (expression, error.filter_error()) {
        (Some(expression), Some(filter_error)) => {
            writeln!(err, "line {line}:")?;
            write!(
                err,
                "{}",
                format_expression_error(expression, filter_error, ctx.use_colors)
            )?;
        }
        _ => writeln!(err, "line {line}: {error}")?,
    }
    Ok(())
}

/// Executes the session command, reading from stdin.
pub fn execute(
    ctx: &CommandContext,
    config: &Config,
    catalog: &Path,
    records: &Path,
    page_size: Option<usize>,
) -> Result<()> {
    let registry = load_catalog(catalog)?;
    let records = load_records(records)?;

    let mut options = config.grid_options();
    if let Some(page_size) = page_size {
        options.page_size = page_size;
    }
    let mut session = Session::new(Grid::with_options(registry, options), records);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let summary = session.run(ctx, stdin.lock(), &mut stdout.lock(), &mut stderr.lock())?;

    if ctx.verbose {
        eprintln!("{} command(s), {} failed", summary.commands, summary.failed);
    }
    Ok(())
}
