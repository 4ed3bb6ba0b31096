//! Fields command implementation.
//!
//! Lists the declared fields of a catalog.

use std::path::Path;

use super::{load_catalog, CommandContext, Result};
use crate::output::{format_fields_json, format_fields_table};

/// Executes the fields command.
pub fn execute(ctx: &CommandContext, catalog: &Path) -> Result<()> {
    let registry = load_catalog(catalog)?;

    if ctx.json_output {
        println!("{}", format_fields_json(&registry)?);
    } else if !ctx.quiet {
        print!("{}", format_fields_table(&registry, ctx.use_colors));
    }

    Ok(())
}
