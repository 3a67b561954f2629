//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Configuration selects how the metafile factory is obtained and tunes
//! the change monitor. It is read once at startup, before the first
//! metadata access, and handed to [`Connection::from_config`].
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$DIRMETA_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/dirmeta/config.toml`
//! 3. `~/.dirmeta/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use dirmeta::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("Strategy: {}", config.strategy());
//! println!("Server: {}", config.server());
//! ```
//!
//! [`Connection::from_config`]: crate::client::Connection::from_config

pub mod schema;

pub use schema::{FactoryConfig, GlobalConfig, MonitorConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Server identifier used for activation when none is configured.
pub const DEFAULT_SERVER: &str = "OAFIID:Dirmeta_MetafileFactory";

/// Default capacity of a directory's event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("factory strategy 'activated' requires an activator for server '{0}'")]
    MissingActivator(String),
}

/// Loaded configuration.
///
/// Accessor methods apply defaults for anything the file leaves unset.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents
    pub global: GlobalConfig,
    /// Path the config was loaded from (if any)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated. A missing file is not an error (defaults are used).
    pub fn load() -> Result<Config, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let global: GlobalConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        global.validate()?;

        Ok(Config {
            global,
            path: Some(path.to_path_buf()),
        })
    }

    /// Locate the first existing config file.
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check $DIRMETA_CONFIG
        if let Ok(path) = std::env::var("DIRMETA_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/dirmeta/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("dirmeta/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.dirmeta/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".dirmeta/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Get the factory strategy name.
    ///
    /// Defaults to "self-contained" if not configured.
    pub fn strategy(&self) -> &str {
        self.global
            .factory
            .as_ref()
            .and_then(|f| f.strategy.as_deref())
            .unwrap_or("self-contained")
    }

    /// Get the server identifier used for activation.
    ///
    /// Defaults to [`DEFAULT_SERVER`] if not configured.
    pub fn server(&self) -> &str {
        self.global
            .factory
            .as_ref()
            .and_then(|f| f.server.as_deref())
            .unwrap_or(DEFAULT_SERVER)
    }

    /// Get the per-directory event channel capacity.
    ///
    /// Defaults to [`DEFAULT_EVENT_BUFFER`] if not configured.
    pub fn event_buffer(&self) -> usize {
        self.global
            .monitor
            .as_ref()
            .and_then(|m| m.event_buffer)
            .unwrap_or(DEFAULT_EVENT_BUFFER)
    }

    /// Get the path the config was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
