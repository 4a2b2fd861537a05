//! Environment variable overrides
//!
//! Variable names match the ones the container images have always used
//! (`BOOK_MONITORING`, `MANGA_MONITORING`, ...), without a prefix.

use crate::{Config, ConfigError, ConfigResult};
use std::path::PathBuf;
use std::str::FromStr;

/// Applies overrides from the process environment
pub fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Applies overrides using `lookup` to resolve variable names
///
/// Unset or blank variables leave the current value untouched; values that
/// cannot be parsed are reported instead of being ignored.
pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(value) = get("WATCH_DIRECTORY") {
        config.watch.root = PathBuf::from(value.trim());
    }
    if let Some(value) = get("BOOK_MONITORING") {
        config.watch.book_monitoring = parse_bool("BOOK_MONITORING", &value)?;
    }
    if let Some(value) = get("MANGA_MONITORING") {
        config.watch.manga_monitoring = parse_bool("MANGA_MONITORING", &value)?;
    }
    if let Some(value) = get("DISCOVERY_MODE") {
        config.watch.discovery = parse_with("DISCOVERY_MODE", &value)?;
    }
    if let Some(value) = get("POLL_INTERVAL") {
        config.watch.poll_interval_secs = parse_seconds("POLL_INTERVAL", &value)?;
    }
    if let Some(value) = get("STABILITY_WAIT") {
        config.watch.stability_wait_secs = parse_seconds("STABILITY_WAIT", &value)?;
    }
    if let Some(value) = get("MAX_WORKERS") {
        config.watch.max_workers = value.trim().parse().map_err(|_| ConfigError::EnvError {
            var: "MAX_WORKERS".to_string(),
            value: value.clone(),
            reason: "expected a positive integer".to_string(),
        })?;
    }
    if let Some(value) = get("COLLISION_POLICY") {
        config.watch.collision_policy = parse_with("COLLISION_POLICY", &value)?;
    }
    if let Some(value) = get("MANGA_LAYOUT") {
        config.watch.manga_layout = parse_with("MANGA_LAYOUT", &value)?;
    }
    if let Some(value) = get("CONVERTER_PROGRAM") {
        config.conversion.program = value.trim().to_string();
    }
    // An explicitly empty option string is meaningful (conversion off), so
    // this one bypasses the blank filter.
    if let Some(value) = lookup("CONVERTER_OPTIONS") {
        config.conversion.options = value.trim().to_string();
    }
    if let Some(value) = get("CONVERTER_TIMEOUT") {
        config.conversion.timeout_secs = parse_seconds("CONVERTER_TIMEOUT", &value)?;
    }
    if let Some(value) = get("METADATA_PROGRAM") {
        config.metadata.program = value.trim().to_string();
    }
    if let Some(value) = get("LOG_LEVEL") {
        config.app.log_level = parse_with("LOG_LEVEL", &value)?;
    }

    Ok(())
}

fn parse_bool(var: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::EnvError {
            var: var.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

fn parse_seconds(var: &str, value: &str) -> ConfigResult<u64> {
    value.trim().parse().map_err(|_| ConfigError::EnvError {
        var: var.to_string(),
        value: value.to_string(),
        reason: "expected a whole number of seconds".to_string(),
    })
}

fn parse_with<T>(var: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr<Err = String>,
{
    value.parse().map_err(|reason| ConfigError::EnvError {
        var: var.to_string(),
        value: value.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CollisionPolicy, DiscoveryMode, LogLevel};
    use std::collections::HashMap;

    fn apply(vars: &[(&str, &str)]) -> ConfigResult<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = Config::default();
        apply_overrides_from(&mut config, |key| vars.get(key).cloned())?;
        Ok(config)
    }

    #[test]
    fn test_no_variables_keeps_defaults() -> ConfigResult<()> {
        assert_eq!(apply(&[])?, Config::default());
        Ok(())
    }

    #[test]
    fn test_monitoring_flags() -> ConfigResult<()> {
        let config = apply(&[("BOOK_MONITORING", "False"), ("MANGA_MONITORING", "TRUE")])?;
        assert!(!config.watch.book_monitoring);
        assert!(config.watch.manga_monitoring);
        Ok(())
    }

    #[test]
    fn test_numeric_and_enum_overrides() -> ConfigResult<()> {
        let config = apply(&[
            ("WATCH_DIRECTORY", "/srv/ebooks"),
            ("DISCOVERY_MODE", "poll"),
            ("POLL_INTERVAL", "15"),
            ("STABILITY_WAIT", "2"),
            ("MAX_WORKERS", "8"),
            ("COLLISION_POLICY", "fail"),
            ("LOG_LEVEL", "debug"),
        ])?;
        assert_eq!(config.watch.root, PathBuf::from("/srv/ebooks"));
        assert_eq!(config.watch.discovery, DiscoveryMode::Poll);
        assert_eq!(config.watch.poll_interval_secs, 15);
        assert_eq!(config.watch.stability_wait_secs, 2);
        assert_eq!(config.watch.max_workers, 8);
        assert_eq!(config.watch.collision_policy, CollisionPolicy::Fail);
        assert_eq!(config.app.log_level, LogLevel::Debug);
        Ok(())
    }

    #[test]
    fn test_converter_options_enable_conversion() -> ConfigResult<()> {
        let config = apply(&[("CONVERTER_OPTIONS", " -p KoLC -m ")])?;
        assert_eq!(config.conversion.options, "-p KoLC -m");
        assert!(config.conversion.is_enabled());
        Ok(())
    }

    #[test]
    fn test_invalid_values_are_reported() {
        assert!(matches!(
            apply(&[("BOOK_MONITORING", "maybe")]),
            Err(ConfigError::EnvError { .. })
        ));
        assert!(matches!(
            apply(&[("POLL_INTERVAL", "-5")]),
            Err(ConfigError::EnvError { .. })
        ));
        assert!(matches!(
            apply(&[("DISCOVERY_MODE", "carrier-pigeon")]),
            Err(ConfigError::EnvError { .. })
        ));
    }
}
