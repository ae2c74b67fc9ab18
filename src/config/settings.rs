use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::overlay::{Theme, DEFAULT_POLL_INTERVAL};
use crate::util::paths::{config_path, database_path};

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Interval between host readiness checks for deferred overlays
    pub readiness_poll_interval: Duration,
    /// Theme applied by the wrapper around presented components
    pub theme: Theme,
    /// Tool selected when nothing has been persisted yet
    pub default_tool: Option<String>,
    /// Location of the tool state database
    pub database_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            readiness_poll_interval: DEFAULT_POLL_INTERVAL,
            theme: Theme::System,
            default_tool: None,
            database_path: database_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlOverlayConfig {
    pub readiness_poll_ms: Option<u64>,
    pub theme: Option<Theme>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlToolsConfig {
    pub default_tool: Option<String>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub overlay: Option<TomlOverlayConfig>,
    pub tools: Option<TomlToolsConfig>,
}

impl Config {
    /// Load configuration from the default config file, writing the bundled
    /// example on first run. Invalid files are logged and ignored.
    pub fn load() -> Self {
        let config_file = config_path();

        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        match Self::load_from(&config_file) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to default configuration");
                Config::default()
            }
        }
    }

    /// Load configuration from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        if !path.exists() {
            return Ok(config);
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let toml_config =
            toml::from_str::<TomlConfig>(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.apply(toml_config);
        Ok(config)
    }

    fn apply(&mut self, toml_config: TomlConfig) {
        if let Some(overlay) = toml_config.overlay {
            if let Some(ms) = overlay.readiness_poll_ms {
                // A zero interval would make tokio's interval panic
                self.readiness_poll_interval = Duration::from_millis(ms.max(1));
            }
            if let Some(theme) = overlay.theme {
                self.theme = theme;
            }
        }

        if let Some(tools) = toml_config.tools {
            if tools.default_tool.is_some() {
                self.default_tool = tools.default_tool;
            }
        }
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    tracing::warn!(error = %e, "Failed to create config directory");
                    return;
                }
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(error = %e, "Failed to write default config");
        }
    }
}
