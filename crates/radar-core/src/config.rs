//! Configuration resolution for Asteroid Radar.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Settings file (`<config dir>/asteroid-radar/settings.json`, or an explicit path)
//! 3. Environment variables (`ASTEROID_RADAR_*`)
//! 4. CLI arguments (applied by the binary, highest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Public demo key accepted by api.nasa.gov (heavily rate limited).
pub const DEMO_API_KEY: &str = "DEMO_KEY";

/// Complete Asteroid Radar configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.nasa.gov".to_string(),
            api_key: DEMO_API_KEY.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Local cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Database file; falls back to [`database_path`] when unset.
    pub database_path: Option<PathBuf>,
}

/// Background refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between periodic syncs in `watch` mode.
    pub refresh_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 24 * 60 * 60, // daily
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Resolved database path: explicit setting, then the platform default.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.cache.database_path.clone().or_else(database_path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.trim().is_empty() {
            return Err(Error::Config("api.api_key must not be empty".into()));
        }
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            return Err(Error::Config(format!(
                "api.base_url must be an http(s) URL, got '{}'",
                self.api.base_url
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(Error::Config("api.timeout_secs must be greater than 0".into()));
        }
        if self.sync.refresh_interval_secs == 0 {
            return Err(Error::Config(
                "sync.refresh_interval_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Load configuration with hierarchical resolution.
///
/// `settings_path` replaces the global settings file; unlike the global
/// file it must exist.
pub fn load_config(settings_path: Option<&Path>) -> Result<Config> {
    let mut config = match settings_path {
        Some(path) => load_config_file(path)?,
        None => match global_config_path() {
            Some(path) if path.exists() => load_config_file(&path)?,
            _ => Config::default(),
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Get the global settings file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("asteroid-radar").join("settings.json"))
}

/// Get the default cache database path.
pub fn database_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("asteroid-radar").join("cache.db"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Apply `ASTEROID_RADAR_*` overrides read through `lookup`.
fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("ASTEROID_RADAR_API_KEY") {
        config.api.api_key = val;
    }
    if let Some(val) = lookup("ASTEROID_RADAR_BASE_URL") {
        config.api.base_url = val;
    }
    if let Some(n) = lookup("ASTEROID_RADAR_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        config.api.timeout_secs = n;
    }
    if let Some(val) = lookup("ASTEROID_RADAR_DB_PATH") {
        config.cache.database_path = Some(PathBuf::from(val));
    }
    if let Some(n) = lookup("ASTEROID_RADAR_REFRESH_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
        config.sync.refresh_interval_secs = n;
    }
    if let Some(val) = lookup("ASTEROID_RADAR_LOG_LEVEL") {
        config.logging.level = val;
    }
}
