//! Error types for the configuration system

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}", path = .path.display())]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write config file
    #[error("Failed to write config file at {path}: {source}", path = .path.display())]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse config file
    #[error("Failed to parse config file at {path}: {source}", path = .path.display())]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Failed to serialize config
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// An environment variable holds a value that cannot be used
    #[error("Invalid value for {var}: '{value}' ({reason})")]
    EnvError {
        var: String,
        value: String,
        reason: String,
    },

    /// Config contains invalid values
    #[error("Config validation failed: {0}")]
    ValidationError(String),

    /// Failed to create a directory
    #[error("Failed to create directory at {path}: {source}", path = .path.display())]
    DirectoryCreationError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Config path could not be resolved
    #[error("Could not resolve config path: {reason}")]
    PathResolutionError { reason: String },

    /// Generic I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Validation error for a specific config field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Path to the field (e.g., "watch.max_workers")
    pub field: String,

    /// Human-readable error message
    pub message: String,

    /// The invalid value, if available
    pub value: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    pub fn with_value(
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: Some(value.to_string()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Field '{}': {}", self.field, self.message)?;
        if let Some(ref value) = self.value {
            write!(f, " (got: {})", value)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("watch.max_workers", "must be between 1 and 256");
        assert_eq!(
            err.to_string(),
            "Field 'watch.max_workers': must be between 1 and 256"
        );
    }

    #[test]
    fn test_validation_error_with_value() {
        let err = ValidationError::with_value("watch.max_workers", "must be between 1 and 256", 0);
        assert_eq!(
            err.to_string(),
            "Field 'watch.max_workers': must be between 1 and 256 (got: 0)"
        );
    }

    #[test]
    fn test_env_error_display() {
        let err = ConfigError::EnvError {
            var: "POLL_INTERVAL".to_string(),
            value: "soon".to_string(),
            reason: "expected a whole number of seconds".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for POLL_INTERVAL: 'soon' (expected a whole number of seconds)"
        );
    }
}
