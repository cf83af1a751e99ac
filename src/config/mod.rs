// Configuration management module
// Handles the TOML settings file and the interactive setup flow

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{Config, ConfigError, OpenAiConfig};

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("Could not determine the platform configuration directory")?
        .join("aula");
    Ok(dir)
}
