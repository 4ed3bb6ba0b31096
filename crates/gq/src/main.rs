use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod dispatch;
mod output;

use cli::Cli;
use commands::config::load_config;
use commands::{error_code, CommandContext, CommandError};
use dispatch::{Dispatch, RunCommand};
use grid_state_rs::GridError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                eprintln!("{error_json:#}");
            } else {
                eprintln!("Error: {e}");
            }
            error_exit_code(&e)
        }
    }
}

fn run(cli: &Cli) -> commands::Result<()> {
    let dispatch = Dispatch::from_cli(cli);

    // Config repair commands must still work when the file does not parse
    let config = if dispatch.needs_config() {
        load_config()?
    } else {
        load_config().unwrap_or_default()
    };

    let ctx = CommandContext::from_cli(cli, &config);
    dispatch.execute(&ctx, &config)
}

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows `--verbose` / `--quiet`.
fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    match e {
        CommandError::Filter(_) => ExitCode::from(1),
        CommandError::Grid(GridError::FilterRejected(_)) => ExitCode::from(1),
        CommandError::Grid(GridError::InvalidState(_)) => ExitCode::from(1),
        CommandError::Json(_) => ExitCode::from(1),
        CommandError::Input(_) => ExitCode::from(2),
        CommandError::Io(_) => ExitCode::from(3),
        CommandError::Config(_) => ExitCode::from(5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_filter_rs::filter::FilterError;

    #[test]
    fn test_exit_codes() {
        let filter = CommandError::Filter(FilterError::parse("x", 0));
        assert_eq!(error_exit_code(&filter), ExitCode::from(1));

        let input = CommandError::Input("x".into());
        assert_eq!(error_exit_code(&input), ExitCode::from(2));

        let config = CommandError::Config("x".into());
        assert_eq!(error_exit_code(&config), ExitCode::from(5));
    }
}
