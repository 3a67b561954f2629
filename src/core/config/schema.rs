//! core::config::schema
//!
//! Configuration schema types.
//!
//! Located at (in order of precedence):
//! 1. `$DIRMETA_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/dirmeta/config.toml`
//! 3. `~/.dirmeta/config.toml`
//!
//! # Validation
//!
//! Config values are validated after parsing so that a bad strategy name
//! is reported at load time rather than at first metadata access.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Global configuration (process scope).
///
/// # Example
///
/// ```toml
/// [factory]
/// strategy = "activated"
/// server = "OAFIID:Dirmeta_MetafileFactory"
///
/// [monitor]
/// event_buffer = 128
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// How the metafile factory is obtained
    pub factory: Option<FactoryConfig>,

    /// Change monitor settings
    pub monitor: Option<MonitorConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(factory) = &self.factory {
            factory.validate()?;
        }

        if let Some(monitor) = &self.monitor {
            monitor.validate()?;
        }

        Ok(())
    }
}

/// Factory resolution settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FactoryConfig {
    /// Strategy name: "self-contained" or "activated"
    pub strategy: Option<String>,

    /// Server identifier handed to the activator
    pub server: Option<String>,
}

impl FactoryConfig {
    /// Validate factory settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(strategy) = &self.strategy {
            if crate::client::StrategyKind::parse(strategy).is_none() {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid factory strategy '{}', must be one of: {}",
                    strategy,
                    crate::client::valid_strategy_names().join(", ")
                )));
            }
        }

        if let Some(server) = &self.server {
            if server.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "factory server cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Change monitor settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Capacity of each directory's event channel
    pub event_buffer: Option<usize>,
}

impl MonitorConfig {
    /// Validate monitor settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_buffer == Some(0) {
            return Err(ConfigError::InvalidValue(
                "monitor event_buffer must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
