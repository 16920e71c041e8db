//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/menutree/menutree.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `MENUTREE_*` prefix
//!
//! The `--database` flag is applied on top by the CLI via [`Settings::with_database`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::services::DEFAULT_CONFLICT_RETRIES;
use crate::application::ApplicationError;

const APP_NAME: &str = "menutree";
const ENV_PREFIX: &str = "MENUTREE";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 2_000;

/// Unified configuration for menutree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// SQLite database file
    pub database: PathBuf,
    /// Retries after a write conflict before failing
    pub max_conflict_retries: u32,
    /// How long a writer waits for the database lock
    pub busy_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            max_conflict_retries: DEFAULT_CONFLICT_RETRIES,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// Raw settings for one config layer; `None` means "inherit".
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub database: Option<PathBuf>,
    pub max_conflict_retries: Option<u32>,
    pub busy_timeout_ms: Option<u64>,
}

fn default_database_path() -> PathBuf {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().join("menutree.db"))
        .unwrap_or_else(|| PathBuf::from("menutree.db"))
}

/// Get the XDG config directory for menutree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("menutree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`; leaves the input alone if a variable is unset.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Override the database path (CLI flag layer).
    pub fn with_database(mut self, database: &Path) -> Self {
        self.database = expand_path(database);
        self
    }

    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            database: overlay
                .database
                .clone()
                .unwrap_or_else(|| self.database.clone()),
            max_conflict_retries: overlay
                .max_conflict_retries
                .unwrap_or(self.max_conflict_retries),
            busy_timeout_ms: overlay.busy_timeout_ms.unwrap_or(self.busy_timeout_ms),
        }
    }

    /// Load settings with layered precedence from the real environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|path| path.exists());
        Self::load_from(global.as_deref(), explicit, env_source())
    }

    /// Load settings from the given layers.
    ///
    /// A missing global file is skipped; a missing explicit file is an error.
    pub fn load_from(
        global: Option<&Path>,
        explicit: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(path) = global {
            if path.exists() {
                debug!("global config: {}", path.display());
                current = current.merge_with(&load_raw_settings(path)?);
            }
        }

        if let Some(path) = explicit {
            debug!("explicit config: {}", path.display());
            current = current.merge_with(&load_raw_settings(path)?);
        }

        current = current.merge_with(&env_overrides(env)?);
        current.database = expand_path(&current.database);
        Ok(current)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }
}

/// `MENUTREE_DATABASE`, `MENUTREE_MAX_CONFLICT_RETRIES`, `MENUTREE_BUSY_TIMEOUT_MS`.
pub fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn env_overrides(env: Environment) -> Result<RawSettings, ApplicationError> {
    let config = Config::builder()
        .add_source(env)
        .build()
        .map_err(config_err)?;
    Ok(RawSettings {
        database: env_value(&config, "database")?,
        max_conflict_retries: env_value(&config, "max_conflict_retries")?,
        busy_timeout_ms: env_value(&config, "busy_timeout_ms")?,
    })
}

/// Only known keys are read, so unrelated `MENUTREE_*` variables
/// (e.g. `MENUTREE_LOG`) pass through untouched.
fn env_value<T: DeserializeOwned>(
    config: &Config,
    key: &str,
) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
