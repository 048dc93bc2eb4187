//! Layered configuration.
//!
//! Sources, later ones winning:
//! - Default values
//! - TOML configuration file
//! - Environment variables
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `DIRDEX_` and use double
//! underscores to separate nested levels:
//! - `DIRDEX_INDEX_PATH=/srv/dirdex` sets `index_path`
//! - `DIRDEX_WATCH__RESYNC_ON_OVERFLOW=true` sets `watch.resync_on_overflow`
//! - `DIRDEX_SEARCH__SNIPPET_CHARS=300` sets `search.snippet_chars`

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::indexer::DEFAULT_MAX_FILE_SIZE;
use crate::storage::DEFAULT_HEAP_SIZE;
use crate::watcher::WatchOptions;

const APP_DIR: &str = "dirdex";
const ENV_PREFIX: &str = "DIRDEX_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory holding the index
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IndexingConfig {
    /// Files larger than this many bytes are skipped
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Index writer memory budget in bytes
    #[serde(default = "default_writer_heap_size")]
    pub writer_heap_size: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatchConfig {
    /// Re-walk affected roots when the OS drops change events
    #[serde(default)]
    pub resync_on_overflow: bool,

    /// Idle wake-up interval of the watch loop
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SearchConfig {
    /// Maximum snippet length in characters
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,

    /// Prompt shown before each query when reading from a terminal
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

/// Logging levels, globally and per module target.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,

    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_version() -> u32 {
    1
}
fn default_index_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("index")
}
fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}
fn default_writer_heap_size() -> usize {
    DEFAULT_HEAP_SIZE
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_snippet_chars() -> usize {
    150
}
fn default_prompt() -> String {
    "> ".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index_path: default_index_path(),
            indexing: IndexingConfig::default(),
            watch: WatchConfig::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            writer_heap_size: default_writer_heap_size(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            resync_on_overflow: false,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            snippet_chars: default_snippet_chars(),
            prompt: default_prompt(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl From<&WatchConfig> for WatchOptions {
    fn from(config: &WatchConfig) -> Self {
        WatchOptions {
            resync_on_overflow: config.resync_on_overflow,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

impl Settings {
    /// Load configuration from the default file location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_config_path())
    }

    /// Load configuration layered over the given file.
    ///
    /// A missing file is not an error; defaults and environment apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// `<config_dir>/dirdex/settings.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("settings.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert!(settings.index_path.ends_with("dirdex/index"));
        assert_eq!(settings.indexing.max_file_size, 16 * 1024 * 1024);
        assert!(!settings.watch.resync_on_overflow);
        assert_eq!(settings.search.prompt, "> ");
        assert_eq!(settings.logging.default, "warn");
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
index_path = "/srv/dirdex"

[indexing]
max_file_size = 1024

[watch]
resync_on_overflow = true
poll_interval_ms = 50

[logging]
default = "info"

[logging.modules]
watcher = "debug"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.index_path, PathBuf::from("/srv/dirdex"));
        assert_eq!(settings.indexing.max_file_size, 1024);
        assert!(settings.watch.resync_on_overflow);
        assert_eq!(settings.logging.default, "info");
        assert_eq!(settings.logging.modules["watcher"], "debug");

        // Untouched values keep their defaults
        assert_eq!(settings.indexing.writer_heap_size, DEFAULT_HEAP_SIZE);
        assert_eq!(settings.search.snippet_chars, 150);

        let options = WatchOptions::from(&settings.watch);
        assert_eq!(options.poll_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from(temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.indexing, IndexingConfig::default());
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "[indexing]\nmax_file_size = \"big\"\n").unwrap();

        assert!(matches!(
            Settings::load_from(&config_path),
            Err(ConfigError::Load(_))
        ));
    }
}
