//! Command implementations for the gq CLI.
//!
//! This module contains the actual command handlers that are invoked by the CLI,
//! plus the loaders for the catalog and record files they share.

pub mod check;
pub mod completions;
pub mod config;
pub mod fields;
pub mod filter;
pub mod session;
pub mod validate;

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use grid_filter_rs::filter::{FilterCondition, FilterError};
use grid_filter_rs::{FieldRegistry, FilterField};
use grid_state_rs::GridError;

use crate::cli::Cli;
use config::Config;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Filter parsing, validation or evaluation error.
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    /// Grid transition error.
    #[error("{0}")]
    Grid(#[from] GridError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed input file or argument.
    #[error("invalid input: {0}")]
    Input(String),
}

impl CommandError {
    /// The filter error behind this failure, if there is one.
    pub fn filter_error(&self) -> Option<&FilterError> {
        match self {
            CommandError::Filter(e) => Some(e),
            CommandError::Grid(e) => e.filter_error(),
            _ => None,
        }
    }
}

/// Returns the error code string for JSON output.
pub fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Filter(_) | CommandError::Grid(GridError::FilterRejected(_)) => {
            "FILTER_ERROR"
        }
        CommandError::Grid(GridError::InvalidState(_)) => "STATE_ERROR",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
        CommandError::Input(_) => "INPUT_ERROR",
    }
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments and the loaded config.
    ///
    /// Colors are on unless `--no-color`, `NO_COLOR` or `output.color = false`
    /// turns them off.
    pub fn from_cli(cli: &Cli, config: &Config) -> Self {
        let color_allowed = std::env::var_os("NO_COLOR").is_none();
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color && color_allowed && config.output.color.unwrap_or(true),
            quiet: cli.quiet,
            verbose: cli.verbose,
        }
    }
}

/// Loads a field catalog from a JSON array of `{key, type, label?}` objects.
pub fn load_catalog(path: &Path) -> Result<FieldRegistry> {
    let content = read_input(path)?;
    let fields: Vec<FilterField> = serde_json::from_str(&content).map_err(|e| {
        CommandError::Input(format!("catalog '{}' is not valid: {e}", path.display()))
    })?;
    let registry = FieldRegistry::new(fields);
    if registry.is_empty() {
        return Err(CommandError::Input(format!(
            "catalog '{}' declares no fields",
            path.display()
        )));
    }
    Ok(registry)
}

/// Loads records from a JSON array of objects. `-` reads standard input.
pub fn load_records(path: &Path) -> Result<Vec<serde_json::Value>> {
    let content = read_input(path)?;
    let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        CommandError::Input(format!("records '{}' are not valid JSON: {e}", path.display()))
    })?;

    let serde_json::Value::Array(records) = value else {
        return Err(CommandError::Input(format!(
            "records '{}' must be a JSON array",
            path.display()
        )));
    };
    if let Some(index) = records.iter().position(|r| !r.is_object()) {
        return Err(CommandError::Input(format!(
            "record {index} in '{}' is not an object",
            path.display()
        )));
    }
    Ok(records)
}

/// Parses a column filter condition given as JSON on the command line.
pub fn parse_condition(raw: &str) -> Result<FilterCondition> {
    serde_json::from_str(raw)
        .map_err(|e| CommandError::Input(format!("condition '{raw}' is not valid: {e}")))
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        return Ok(content);
    }
    fs::read_to_string(path)
        .map_err(|e| CommandError::Input(format!("cannot read '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_filter_rs::filter::FilterOperator;
    use grid_filter_rs::FieldType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_catalog() {
        let file = write_temp(
            r#"[{"key":"name","type":"string"},{"key":"age","type":"number","label":"Age"}]"#,
        );
        let registry = load_catalog(file.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.field_type("age"), Some(FieldType::Number));
    }

    #[test]
    fn test_load_catalog_rejects_empty_and_invalid() {
        let empty = write_temp("[]");
        assert!(matches!(load_catalog(empty.path()), Err(CommandError::Input(_))));

        let bad_type = write_temp(r#"[{"key":"x","type":"uuid"}]"#);
        assert!(matches!(load_catalog(bad_type.path()), Err(CommandError::Input(_))));
    }

    #[test]
    fn test_load_catalog_missing_file() {
        let err = load_catalog(Path::new("/nonexistent/gq-catalog.json")).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }

    #[test]
    fn test_load_records() {
        let file = write_temp(r#"[{"a":1},{"a":2}]"#);
        assert_eq!(load_records(file.path()).unwrap().len(), 2);

        let not_array = write_temp(r#"{"a":1}"#);
        let err = load_records(not_array.path()).unwrap_err();
        assert!(err.to_string().contains("must be a JSON array"));

        let scalar_row = write_temp(r#"[{"a":1}, 3]"#);
        let err = load_records(scalar_row.path()).unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }

    #[test]
    fn test_parse_condition_shapes() {
        let nested = parse_condition(r#"{"field":"age","condition":{"operator":"gt","value":3}}"#)
            .unwrap();
        let flat = parse_condition(r#"{"field":"age","operator":"gt","value":3}"#).unwrap();
        assert_eq!(nested, flat);
        assert_eq!(nested.operator, FilterOperator::Gt);

        assert!(parse_condition("not json").is_err());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(error_code(&FilterError::parse("x", 0).into()), "FILTER_ERROR");
        assert_eq!(
            error_code(&GridError::FilterRejected(FilterError::parse("x", 0)).into()),
            "FILTER_ERROR"
        );
        assert_eq!(error_code(&CommandError::Input("x".into())), "INPUT_ERROR");
        assert_eq!(error_code(&CommandError::Config("x".into())), "CONFIG_ERROR");
    }

    #[test]
    fn test_filter_error_unwraps_grid_rejection() {
        let err = CommandError::Grid(GridError::FilterRejected(FilterError::parse("bad", 2)));
        assert_eq!(err.filter_error().and_then(FilterError::position), Some(2));
        assert!(CommandError::Config("x".into()).filter_error().is_none());
    }
}
