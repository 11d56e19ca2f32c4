//! Configuration file resolution and TOML loading
//!
//! The bootstrap file is located in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `PEP_CONFIG` environment variable
//! 3. User config directory (`~/.config/pep-attendance/config.toml`)
//! 4. System config (`/etc/pep-attendance/config.toml`, Linux only)
//!
//! When none of these exists the caller falls back to compiled defaults.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PEP_CONFIG";

/// Directory name used under the platform config directory
pub const APP_DIR_NAME: &str = "pep-attendance";

/// Config file name inside [`APP_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Where a resolved config path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine,
    Environment,
    UserConfigDir,
    SystemConfigDir,
}

/// Resolves the bootstrap config file path
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Resolve the config path, returning `None` when no tier supplies one.
    ///
    /// Explicit paths (CLI, env) are returned even when the file is missing so
    /// that the loader can report it; discovered paths must exist.
    pub fn resolve(&self) -> Option<(PathBuf, ConfigSource)> {
        if let Some(path) = &self.cli_path {
            return Some((path.clone(), ConfigSource::CommandLine));
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some((PathBuf::from(path), ConfigSource::Environment));
            }
        }

        if let Some(path) = user_config_path() {
            if path.exists() {
                return Some((path, ConfigSource::UserConfigDir));
            }
        }

        if cfg!(target_os = "linux") {
            let system = PathBuf::from("/etc").join(APP_DIR_NAME).join(CONFIG_FILE_NAME);
            if system.exists() {
                return Some((system, ConfigSource::SystemConfigDir));
            }
        }

        None
    }

    /// Load the resolved config, falling back to `T::default()`.
    ///
    /// A missing discovered file is not an error. A file that exists but does
    /// not parse is reported, since silently ignoring it would hide typos.
    pub fn load<T>(&self) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.resolve() {
            Some((path, source)) => {
                if !path.exists() {
                    warn!(
                        "Config file {} ({:?}) not found, using defaults",
                        path.display(),
                        source
                    );
                    return Ok(T::default());
                }
                info!("Loading config from {} ({:?})", path.display(), source);
                read_toml(&path)
            }
            None => {
                debug!("No config file found, using compiled defaults");
                Ok(T::default())
            }
        }
    }
}

/// Platform user config path (`<config_dir>/pep-attendance/config.toml`)
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Read and parse a TOML file
pub fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Render a value as pretty TOML
pub fn to_toml_string<T: Serialize>(value: &T) -> Result<String> {
    toml::to_string_pretty(value).map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))
}
