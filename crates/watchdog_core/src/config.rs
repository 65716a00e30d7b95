//! Runtime configuration for the persistence core.
//!
//! # Responsibility
//! - Describe where the backing store lives and how logging is set up.
//! - Load settings from serde sources or from `WATCHDOG_*` environment
//!   variables.
//!
//! # Invariants
//! - Every field has a default; an empty document is a valid config.
//! - `store.path = None` selects an in-memory store.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "WATCHDOG_DB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "WATCHDOG_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "WATCHDOG_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "WATCHDOG_LOG_DIR";

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    pub store: StoreConfig,
    /// File logging is only started when this section is present.
    pub log: Option<LogConfig>,
}

/// Backing store location and connection tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// Rolling file logger settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_level_string")]
    pub level: String,
    /// Must be absolute.
    pub dir: PathBuf,
}

impl LogConfig {
    pub fn new(level: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            level: level.into(),
            dir: dir.into(),
        }
    }
}

fn default_level_string() -> String {
    crate::logging::default_log_level().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for {key}")
            }
        }
    }
}

impl Error for ConfigError {}

impl WatchdogConfig {
    /// Builds a config from `WATCHDOG_*` environment variables.
    ///
    /// Unset variables keep their defaults. Logging is enabled only when
    /// `WATCHDOG_LOG_DIR` is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`WatchdogConfig::from_env`] over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH).filter(|value| !value.trim().is_empty()) {
            config.store.path = Some(PathBuf::from(path.trim()));
        }
        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            config.store.busy_timeout_ms =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_BUSY_TIMEOUT_MS,
                        value: raw.clone(),
                    })?;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|value| !value.trim().is_empty()) {
            let level = lookup(ENV_LOG_LEVEL).unwrap_or_else(default_level_string);
            config.log = Some(LogConfig::new(level, dir.trim()));
        }

        Ok(config)
    }
}
