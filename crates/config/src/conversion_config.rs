//! External tool settings: page converter and metadata editor

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Page converter settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConversionConfig {
    /// Converter executable
    pub program: String,

    /// Free-form option string passed before the source path; empty disables conversion
    pub options: String,

    /// Kill the converter after this many seconds (0 = no limit)
    pub timeout_secs: u64,

    /// Delete the source archive once its conversion output was found
    pub remove_source: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            program: "kcc-c2e".to_string(),
            options: String::new(),
            timeout_secs: 0,
            remove_source: true,
        }
    }
}

impl ConversionConfig {
    /// Conversion runs only when an option string is configured
    pub fn is_enabled(&self) -> bool {
        !self.options.trim().is_empty()
    }
}

impl ConfigSection for ConversionConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![Validator::in_range(
            self.timeout_secs,
            0,
            24 * 3_600,
            &self.field("timeout_secs"),
        )];

        if self.is_enabled() {
            results.push(Validator::not_empty(&self.program, &self.field("program")));
        }

        Validator::collect_errors(results)
    }

    fn section_name(&self) -> &'static str {
        "conversion"
    }
}

/// Metadata editor settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetadataConfig {
    /// Executable used to read and write embedded metadata
    pub program: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            program: "ebook-meta".to_string(),
        }
    }
}

impl ConfigSection for MetadataConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![Validator::not_empty(
            &self.program,
            &self.field("program"),
        )])
    }

    fn section_name(&self) -> &'static str {
        "metadata"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_disabled_by_default() {
        let config = ConversionConfig::default();
        assert!(!config.is_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_options_keep_conversion_disabled() {
        let config = ConversionConfig {
            options: "   ".to_string(),
            ..Default::default()
        };
        assert!(!config.is_enabled());
    }

    #[test]
    fn test_enabled_conversion_needs_program() {
        let config = ConversionConfig {
            program: String::new(),
            options: "-p KoC --forcecolor".to_string(),
            ..Default::default()
        };
        assert!(config.is_enabled());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_metadata_program_required() {
        assert!(MetadataConfig::default().validate().is_ok());
        let config = MetadataConfig {
            program: " ".to_string(),
        };
        assert!(config.validate().is_err());
    }
}
