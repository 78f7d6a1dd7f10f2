//! Configuration loading
//!
//! Settings come from a JSON file (explicit path, or the platform config
//! directory), then CLI flags and environment variables override them.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Engine defaults handed to the evaluator at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Limit used when a query does not set one
    pub default_limit: usize,
    /// Largest accepted limit
    pub max_limit: usize,
    /// Default similarity threshold for `fuzzy`
    pub fuzzy_threshold: f64,
    /// Minimum similarity for a record to be a unified candidate
    pub unified_floor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 1000,
            fuzzy_threshold: 0.3,
            unified_floor: 0.2,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_limit == 0 || self.max_limit == 0 {
            bail!("engine limits must be positive");
        }
        if self.default_limit > self.max_limit {
            bail!(
                "default_limit {} exceeds max_limit {}",
                self.default_limit,
                self.max_limit
            );
        }
        for (name, value) in [
            ("fuzzy_threshold", self.fuzzy_threshold),
            ("unified_floor", self.unified_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must be within [0, 1], got {}", name, value);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Per-request deadline for the store read
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub server: ServerConfig,
    /// Directory of JSON record files
    pub data_dir: Option<PathBuf>,
}

/// Default location of the configuration file
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
    Ok(config_dir.join("medsearch").join("config.json"))
}

/// Load configuration from `explicit`, else the default path if present,
/// else built-in defaults
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match config_path() {
            Ok(p) if p.exists() => p,
            _ => return Ok(Config::default()),
        },
    };

    debug!("Loading config from {}", path.display());
    let data = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    config.engine.validate()?;
    Ok(config)
}
