//! Shelfwatch Configuration System
//!
//! Configuration is an explicit value built once at startup and handed to the
//! ingestion engine. Values come from, in increasing precedence:
//!
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. environment variables (`BOOK_MONITORING`, `POLL_INTERVAL`, ...)
//! 4. command-line flags (applied by the binary)
//!
//! # Example
//!
//! ```rust
//! use shelfwatch_config::Config;
//!
//! let config = Config::default();
//! assert!(config.validate().is_ok());
//! assert!(!config.conversion.is_enabled());
//! ```

mod env;
mod error;
mod manager;
mod persistence;
mod validation;

// Config sections
pub mod app_config;
mod conversion_config;
mod watch_config;

pub use env::{apply_env_overrides, apply_overrides_from};
pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::ConfigManager;
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use conversion_config::{ConversionConfig, MetadataConfig};
pub use watch_config::{CollisionPolicy, DiscoveryMode, MangaLayout, WatchConfig};

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Process-level settings
    pub app: AppConfig,

    /// Watched tree, discovery and placement
    pub watch: WatchConfig,

    /// External page converter
    pub conversion: ConversionConfig,

    /// External metadata tool
    pub metadata: MetadataConfig,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration
    ///
    /// Returns all validation errors found across all sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.app.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.watch.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.conversion.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.metadata.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates and folds every problem into a single [`ConfigError`]
    pub fn validated(self) -> ConfigResult<Self> {
        match self.validate() {
            Ok(()) => Ok(self),
            Err(errors) => Err(ConfigError::ValidationError(
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            watch: WatchConfig::default(),
            conversion: ConversionConfig::default(),
            metadata: MetadataConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_version_is_set() {
        let config = Config::default();
        assert_eq!(config.version, CONFIG_VERSION);
    }

    #[test]
    fn test_validated_joins_section_errors() {
        let mut config = Config::default();
        config.watch.max_workers = 0;
        config.metadata.program = String::new();

        let err = config.validated().expect_err("should be invalid");
        let message = err.to_string();
        assert!(message.contains("watch.max_workers"));
        assert!(message.contains("metadata.program"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[watch]\nmax_workers = 8\n").expect("parse");
        assert_eq!(config.watch.max_workers, 8);
        assert_eq!(config.watch.books_dir, "books");
        assert_eq!(config.version, CONFIG_VERSION);
    }
}
