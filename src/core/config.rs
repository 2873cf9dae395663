//! Configuration management for the feed store
//!
//! Settings come from defaults, then an optional TOML file, then environment
//! variables, and are validated before use.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Default configuration file looked up by [`Config::load`]
pub const DEFAULT_CONFIG_FILE: &str = "feedstore.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store configuration
    pub store: StoreConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Scope of the locks that serialize read-modify-write sequences
    pub lock_granularity: LockGranularity,

    /// Number of lock stripes that document keys hash onto
    pub lock_stripes: usize,

    /// Populate a fresh store with demo users, feeds and status updates
    pub seed_demo_data: bool,
}

/// Scope of a mutation lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockGranularity {
    /// One lock per `(collection, id)`
    Document,
    /// One lock per collection
    Collection,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, compact)
    pub format: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_granularity: LockGranularity::Document,
            lock_stripes: 64,
            seed_demo_data: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl FromStr for LockGranularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "document" => Ok(LockGranularity::Document),
            "collection" => Ok(LockGranularity::Collection),
            other => Err(Error::config(format!(
                "Invalid lock granularity: {}. Valid options: document, collection",
                other
            ))),
        }
    }
}

impl Config {
    /// Load configuration from the default file (if present) and environment variables
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(granularity) = env::var("FEEDSTORE_LOCK_GRANULARITY") {
            self.store.lock_granularity = granularity.parse()?;
        }

        if let Ok(level) = env::var("FEEDSTORE_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = env::var("FEEDSTORE_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.store.lock_stripes == 0 || self.store.lock_stripes > 4096 {
            return Err(Error::config("Lock stripes must be between 1 and 4096"));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(Error::config(format!("Invalid log level: {}", other))),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            other => return Err(Error::config(format!("Invalid log format: {}", other))),
        }

        Ok(())
    }
}
