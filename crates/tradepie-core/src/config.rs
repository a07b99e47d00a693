//! Runtime configuration resolved from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `TRADEPIE_ENDPOINT` | `http://localhost:3000/api/trading` |
//! | `TRADEPIE_HOME` | `$HOME/.tradepie` |
//! | `TRADEPIE_STORAGE_KEY` | `trading` |
//! | `TRADEPIE_CHANGE_THRESHOLD_PCT` | `3` |
//! | `TRADEPIE_HIGH_FREQUENCY_MS` | `5000` |
//! | `TRADEPIE_LOW_FREQUENCY_MS` | `15000` |
//!
//! Unset, blank or unparseable values fall back to the default.

use std::env;
use std::path::PathBuf;

use crate::frequency::{
    PollingConfig, DEFAULT_CHANGE_THRESHOLD_PCT, DEFAULT_HIGH_FREQUENCY_MS,
    DEFAULT_LOW_FREQUENCY_MS,
};
use crate::store::DEFAULT_STORAGE_KEY;
use crate::ValidationError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/trading";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub endpoint: String,
    /// Directory holding persisted application state.
    pub home: PathBuf,
    pub storage_key: String,
    pub polling: PollingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from(DEFAULT_ENDPOINT),
            home: resolve_tradepie_home(),
            storage_key: String::from(DEFAULT_STORAGE_KEY),
            polling: PollingConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ValidationError> {
        Ok(Self {
            endpoint: env_str("TRADEPIE_ENDPOINT", DEFAULT_ENDPOINT),
            home: resolve_tradepie_home(),
            storage_key: env_str("TRADEPIE_STORAGE_KEY", DEFAULT_STORAGE_KEY),
            polling: PollingConfig::from_millis(
                env_f64("TRADEPIE_CHANGE_THRESHOLD_PCT", DEFAULT_CHANGE_THRESHOLD_PCT),
                env_u64("TRADEPIE_HIGH_FREQUENCY_MS", DEFAULT_HIGH_FREQUENCY_MS),
                env_u64("TRADEPIE_LOW_FREQUENCY_MS", DEFAULT_LOW_FREQUENCY_MS),
            )?,
        })
    }
}

/// Resolve the tradepie home directory from environment or default.
pub fn resolve_tradepie_home() -> PathBuf {
    if let Some(path) = env::var_os("TRADEPIE_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".tradepie");
    }

    PathBuf::from(".tradepie")
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .filter(|value: &f64| value.is_finite())
        .unwrap_or(default)
}
