//! Command-line front ends for both binaries.

pub mod args;
pub mod commands;
pub mod script;

pub use args::{Cli, SearchCli};
pub use script::{BatchCommand, ScriptError, parse_commands};

use std::path::{Path, PathBuf};

use crate::config::{ConfigError, Settings};

/// Load settings from `config` (or the default location) and apply CLI
/// overrides.
pub fn load_settings(
    config: Option<&Path>,
    index_path: Option<PathBuf>,
) -> Result<Settings, ConfigError> {
    let mut settings = match config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    if let Some(index_path) = index_path {
        settings.index_path = index_path;
    }
    Ok(settings)
}
