//! Check command implementation.
//!
//! Parses an expression against a catalog and prints its canonical form.

use std::path::Path;

use grid_filter_rs::filter::FilterParser;
use grid_filter_rs::FieldRegistry;
use serde::Serialize;

use super::{load_catalog, CommandContext, Result};
use crate::output::format_error_pointer;

/// JSON output structure for a successful check.
#[derive(Debug, Serialize)]
pub struct CheckResult<'a> {
    pub expression: &'a str,
    pub canonical: String,
    pub fields: Vec<String>,
}

/// Parses `expression`, returning its canonical form and the fields it references.
pub fn check_expression<'a>(
    expression: &'a str,
    registry: &FieldRegistry,
) -> Result<CheckResult<'a>> {
    let parsed = FilterParser::parse(expression, registry)?;
    Ok(CheckResult {
        expression,
        canonical: parsed.to_string(),
        fields: parsed.identifiers().into_iter().map(String::from).collect(),
    })
}

/// Executes the check command.
pub fn execute(ctx: &CommandContext, expression: &str, catalog: &Path) -> Result<()> {
    let registry = load_catalog(catalog)?;

    let result = match check_expression(expression, &registry) {
        Ok(result) => result,
        Err(e) => {
            if !ctx.json_output && !ctx.quiet {
                if let Some(pointer) = e
                    .filter_error()
                    .and_then(|fe| format_error_pointer(expression, fe, ctx.use_colors))
                {
                    eprint!("{pointer}");
                }
            }
            return Err(e);
        }
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if !ctx.quiet {
        println!("{}", result.canonical);
        if ctx.verbose && !result.fields.is_empty() {
            println!("fields: {}", result.fields.join(", "));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandError;
    use grid_filter_rs::filter::FilterError;
    use grid_filter_rs::{FieldType, FilterField};

    fn registry() -> FieldRegistry {
        FieldRegistry::new([
            FilterField::new("age", FieldType::Number),
            FilterField::new("name", FieldType::String),
        ])
    }

    #[test]
    fn test_check_canonical_form() {
        let registry = registry();
        let result = check_expression("age>3&&name contains 'a'||!(age<1)", &registry).unwrap();
        assert_eq!(
            result.canonical,
            r#"((age > 3 && name contains "a") || !age < 1)"#
        );
        assert_eq!(result.fields, vec!["age", "name"]);
    }

    #[test]
    fn test_check_reports_parse_position() {
        let registry = registry();
        let err = check_expression("age >", &registry).unwrap_err();
        assert!(matches!(
            err,
            CommandError::Filter(FilterError::Parse { position: 4, .. })
        ));
    }

    #[test]
    fn test_check_unknown_field_suggestion() {
        let registry = registry();
        let err = check_expression("agee > 3", &registry).unwrap_err();
        match err {
            CommandError::Filter(FilterError::UnknownField { suggestion, .. }) => {
                assert_eq!(suggestion.as_deref(), Some("age"));
            }
            other => panic!("expected unknown field, got {other:?}"),
        }
    }

    #[test]
    fn test_check_points_at_unconvertible_literal() {
        let registry = registry();
        let err = check_expression("age > abc", &registry).unwrap_err();
        let filter_error = err.filter_error().unwrap();
        assert_eq!(filter_error.position(), Some(6));

        let text = crate::output::format_expression_error("age > abc", filter_error, false);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[1], "        ^");
        assert_eq!(lines[2], "cannot convert 'abc' to number at position 6");
    }
}
