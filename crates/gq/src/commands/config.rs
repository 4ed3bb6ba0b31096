//! Config command implementation.
//!
//! View and initialise configuration settings.
//! Config file is located at ~/.config/gq/config.toml.

use std::env;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use grid_filter_rs::filter::{ComposeOptions, ErrorPolicy};
use grid_state_rs::{GridOptions, DEFAULT_MAX_FILTER_HISTORY, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Default config file contents.
const DEFAULT_CONFIG: &str = r#"# gq - grid query CLI configuration

# Config schema version (do not modify)
version = 1

# Grid defaults
[grid]
# page_size = 25
# max_filter_history = 10

# Filter composition
[filter]
# error_policy = "fail-open"         # "fail-open" keeps records that fail to evaluate, "fail-closed" drops them
# quick_filter_fields = ["name"]     # Fields searched by the quick filter (default: every string field)

# Output preferences
[output]
# color = true                       # Enable colors (respects NO_COLOR env)
"#;

/// Configuration file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    /// Defaults to current version when not present in file.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Grid settings.
    #[serde(default)]
    pub grid: GridConfig,

    /// Filter settings.
    #[serde(default)]
    pub filter: FilterConfigSection,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            grid: GridConfig::default(),
            filter: FilterConfigSection::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Grid options with config values applied over the library defaults.
    pub fn grid_options(&self) -> GridOptions {
        GridOptions {
            page_size: self.grid.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            max_filter_history: self
                .grid
                .max_filter_history
                .unwrap_or(DEFAULT_MAX_FILTER_HISTORY),
            compose: ComposeOptions {
                quick_filter_fields: self.filter.quick_filter_fields.clone(),
                error_policy: self.filter.error_policy.unwrap_or_default(),
                ..ComposeOptions::default()
            },
        }
    }
}

/// Grid configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GridConfig {
    /// Rows per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,

    /// Number of filter states kept for undo/redo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_filter_history: Option<usize>,
}

/// Filter configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FilterConfigSection {
    /// What happens to records whose evaluation fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_policy: Option<ErrorPolicy>,

    /// Fields searched by the quick filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_filter_fields: Option<Vec<String>>,
}

/// Output configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Enable colors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

/// Gets the config directory path.
/// Uses XDG-style paths: ~/.config/gq/ on all platforms.
fn get_config_dir() -> Result<PathBuf> {
    if let Ok(path) = env::var("GQ_CONFIG") {
        let path = PathBuf::from(path);
        if let Some(parent) = path.parent() {
            return Ok(parent.to_path_buf());
        }
    }

    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("gq"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("gq"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Gets the config file path.
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var("GQ_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    let config_dir = get_config_dir()?;
    Ok(config_dir.join("config.toml"))
}

/// Loads the configuration from disk.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    migrate_config(config)
}

/// Migrates config to current version if needed.
fn migrate_config(mut config: Config) -> Result<Config> {
    if config.version > CONFIG_VERSION {
        return Err(CommandError::Config(format!(
            "Config version {} is newer than supported version {}",
            config.version, CONFIG_VERSION
        )));
    }

    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config()?;
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        let options = config.grid_options();
        println!("[grid]");
        println!("  page_size: {}", options.page_size);
        println!("  max_filter_history: {}", options.max_filter_history);

        println!("\n[filter]");
        println!("  error_policy: {}", options.compose.error_policy);
        match &options.compose.quick_filter_fields {
            Some(fields) => println!("  quick_filter_fields: {}", fields.join(", ")),
            None => println!("  quick_filter_fields: (all string fields)"),
        }

        println!("\n[output]");
        println!("  color: {}", config.output.color.unwrap_or(true));

        if !path.exists() {
            println!("\n(No config file exists. Run 'gq config init' to create one.)");
        }
    }

    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Executes the config init command, writing the default config file.
pub fn execute_init(ctx: &CommandContext, force: bool) -> Result<()> {
    let path = get_config_path()?;

    if path.exists() && !force {
        return Err(CommandError::Config(format!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CommandError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    fs::write(&path, DEFAULT_CONFIG)
        .map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "created",
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Created default config at: {}", path.display());
    }

    Ok(())
}
