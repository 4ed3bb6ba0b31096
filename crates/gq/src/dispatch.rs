//! Command dispatch module for routing CLI commands to their handlers.
//!
//! Parsed clap commands are borrowed into a [`Dispatch`] value, which keeps the
//! match on subcommands out of main.rs.

use std::path::Path;

use crate::cli::{Cli, Commands, ConfigCommands, Shell};
use crate::commands::config::Config;
use crate::commands::filter::FilterOptions;
use crate::commands::{self, CommandContext, CommandError, Result};

/// Trait for commands the CLI can execute.
pub trait RunCommand {
    /// Execute the command with the loaded configuration.
    fn execute(&self, ctx: &CommandContext, config: &Config) -> Result<()>;
}

/// A parsed command with borrowed arguments.
pub enum Dispatch<'a> {
    Fields {
        catalog: &'a Path,
    },
    Check {
        expression: &'a str,
        catalog: &'a Path,
    },
    Validate {
        condition: &'a str,
        catalog: Option<&'a Path>,
    },
    Filter(FilterOptions<'a>),
    Session {
        catalog: &'a Path,
        records: &'a Path,
        page_size: Option<usize>,
    },
    Config(&'a Option<ConfigCommands>),
    Completions(&'a Shell),
    Help,
}

impl<'a> Dispatch<'a> {
    /// Creates a dispatch from the CLI command.
    pub fn from_cli(cli: &'a Cli) -> Self {
        match &cli.command {
            Some(Commands::Fields { catalog }) => Self::Fields { catalog },
            Some(Commands::Check {
                expression,
                catalog,
            }) => Self::Check {
                expression,
                catalog,
            },
            Some(Commands::Validate { condition, catalog }) => Self::Validate {
                condition,
                catalog: catalog.as_deref(),
            },
            Some(Commands::Filter {
                catalog,
                records,
                quick,
                expr,
                column,
                sort,
                desc,
                page,
                page_size,
                fail_closed,
            }) => Self::Filter(FilterOptions {
                catalog,
                records,
                quick: quick.as_deref(),
                expr: expr.as_deref(),
                columns: column,
                sort: sort.as_deref(),
                desc: *desc,
                page: *page,
                page_size: *page_size,
                fail_closed: *fail_closed,
            }),
            Some(Commands::Session {
                catalog,
                records,
                page_size,
            }) => Self::Session {
                catalog,
                records,
                page_size: *page_size,
            },
            Some(Commands::Config { command }) => Self::Config(command),
            Some(Commands::Completions { shell }) => Self::Completions(shell),
            None => Self::Help,
        }
    }

    /// Whether the command can run with a broken config file.
    pub fn needs_config(&self) -> bool {
        !matches!(
            self,
            Self::Config(Some(ConfigCommands::Path | ConfigCommands::Init { .. }))
                | Self::Completions(_)
                | Self::Help
        )
    }
}

impl RunCommand for Dispatch<'_> {
    fn execute(&self, ctx: &CommandContext, config: &Config) -> Result<()> {
        match self {
            Self::Fields { catalog } => commands::fields::execute(ctx, catalog),
            Self::Check {
                expression,
                catalog,
            } => commands::check::execute(ctx, expression, catalog),
            Self::Validate { condition, catalog } => {
                commands::validate::execute(ctx, condition, *catalog)
            }
            Self::Filter(opts) => commands::filter::execute(ctx, config, opts),
            Self::Session {
                catalog,
                records,
                page_size,
            } => commands::session::execute(ctx, config, catalog, records, *page_size),
            Self::Config(command) => dispatch_config(ctx, command),
            Self::Completions(shell) => {
                commands::completions::execute(shell).map_err(CommandError::Io)
            }
            Self::Help => {
                if !ctx.quiet {
                    println!("gq - grid query CLI");
                    println!("Use --help for usage information");
                }
                Ok(())
            }
        }
    }
}

/// Dispatch config subcommands.
fn dispatch_config(ctx: &CommandContext, command: &Option<ConfigCommands>) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::execute_show(ctx),
        Some(ConfigCommands::Path) => commands::config::execute_path(ctx),
        Some(ConfigCommands::Init { force }) => commands::config::execute_init(ctx, *force),
    }
}
