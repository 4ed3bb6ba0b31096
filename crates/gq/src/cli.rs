//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the gq CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// gq - Filter, sort and page JSON records with grid filter expressions
#[derive(Parser, Debug)]
#[command(name = "gq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Force JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the fields of a catalog
    Fields {
        /// Field catalog (JSON array of {key, type, label?})
        #[arg(short, long, env = "GQ_CATALOG")]
        catalog: PathBuf,
    },

    /// Parse an expression and print its canonical form
    #[command(alias = "c")]
    Check {
        /// Filter expression (e.g., "age > 30 && active == true")
        expression: String,

        /// Field catalog (JSON array of {key, type, label?})
        #[arg(short, long, env = "GQ_CATALOG")]
        catalog: PathBuf,
    },

    /// Validate one column filter condition
    Validate {
        /// Condition JSON (e.g., '{"field":"age","condition":{"operator":"gt","value":30}}')
        condition: String,

        /// Also check the condition against a field catalog
        #[arg(short, long, env = "GQ_CATALOG")]
        catalog: Option<PathBuf>,
    },

    /// Filter, sort and page a set of records
    #[command(alias = "f")]
    Filter {
        /// Field catalog (JSON array of {key, type, label?})
        #[arg(short, long, env = "GQ_CATALOG")]
        catalog: PathBuf,

        /// Records (JSON array of objects, "-" for stdin)
        #[arg(short, long)]
        records: PathBuf,

        /// Quick filter text
        #[arg(long)]
        quick: Option<String>,

        /// Filter expression
        #[arg(short, long)]
        expr: Option<String>,

        /// Column filter condition as JSON (repeatable)
        #[arg(long, action = clap::ArgAction::Append)]
        column: Vec<String>,

        /// Sort by field
        #[arg(short, long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,

        /// Page to show (1-indexed)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Rows per page (default: from config, else 25)
        #[arg(long)]
        page_size: Option<usize>,

        /// Drop records whose evaluation fails instead of keeping them
        #[arg(long)]
        fail_closed: bool,
    },

    /// Drive a grid interactively with commands read from stdin
    Session {
        /// Field catalog (JSON array of {key, type, label?})
        #[arg(short, long, env = "GQ_CATALOG")]
        catalog: PathBuf,

        /// Records (JSON array of objects)
        #[arg(short, long)]
        records: PathBuf,

        /// Rows per page (default: from config, else 25)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// View and initialise configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Shell types for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print config file path
    Path,

    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}
