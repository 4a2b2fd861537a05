//! Configuration manager - main API for config operations

use crate::env::apply_env_overrides;
use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigResult};
use std::path::{Path, PathBuf};

/// Loads the effective configuration for a process
///
/// Without a config file the manager works from defaults plus environment
/// overrides, which is how the container images are normally run.
pub struct ConfigManager {
    persistence: Option<ConfigPersistence>,
}

impl ConfigManager {
    /// Creates a manager that does not read any config file
    pub fn new() -> Self {
        Self { persistence: None }
    }

    /// Creates a manager backed by the TOML file at `path`
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            persistence: Some(ConfigPersistence::new(path.into())),
        }
    }

    /// Returns the config file path, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.persistence.as_ref().map(|p| p.config_path())
    }

    /// Loads the config file (or defaults) without environment overrides
    pub fn load(&self) -> ConfigResult<Config> {
        match &self.persistence {
            Some(persistence) => persistence.load(),
            None => Ok(Config::default()),
        }
    }

    /// Loads the config file and applies environment overrides
    ///
    /// The result is not validated; callers apply their own overrides first
    /// and then call [`Config::validated`].
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Saves `config` to the backing file
    ///
    /// Returns `Ok(false)` when the manager has no file to write to.
    pub fn save(&self, config: &Config) -> ConfigResult<bool> {
        match &self.persistence {
            Some(persistence) => {
                persistence.save(config)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Writes a default config file if none exists yet
    ///
    /// Returns `Ok(true)` if a new file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        match self.config_path() {
            Some(path) if path.exists() => {
                log::info!("Config file already exists at {}", path.display());
                Ok(false)
            }
            Some(_) => self.save(&Config::default()),
            None => Ok(false),
        }
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
