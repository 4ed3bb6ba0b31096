//! Validate command implementation.
//!
//! Checks one column filter condition, structurally or against a catalog.

use std::path::Path;

use grid_filter_rs::filter::{validate, validate_against, FilterCondition};
use grid_filter_rs::FieldRegistry;

use super::{load_catalog, parse_condition, CommandContext, Result};

/// Validates a condition given as JSON, against `registry` when one is supplied.
pub fn validate_condition(raw: &str, registry: Option<&FieldRegistry>) -> Result<FilterCondition> {
    let condition = parse_condition(raw)?;
    match registry {
        Some(registry) => validate_against(&condition, registry)?,
        None => validate(&condition)?,
    }
    Ok(condition)
}

/// Executes the validate command.
pub fn execute(ctx: &CommandContext, raw: &str, catalog: Option<&Path>) -> Result<()> {
    let registry = catalog.map(load_catalog).transpose()?;
    let condition = validate_condition(raw, registry.as_ref())?;

    if ctx.json_output {
        let output = serde_json::json!({
            "valid": true,
            "condition": condition,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        match &condition.value2 {
            Some(high) => println!(
                "valid: {} {} {} and {}",
                condition.field, condition.operator, condition.value, high
            ),
            None => println!(
                "valid: {} {} {}",
                condition.field, condition.operator, condition.value
            ),
        }
    }

    Ok(())
}
