//! Shared configuration for the spark CLI.
//!
//! Layered settings (defaults, TOML file, `SPARK_*` environment), cache path
//! resolution, and translation to `spark_core::CloudConfig`. The CLI adds
//! flag-aware overrides on top.

use std::path::PathBuf;
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use spark_core::CloudConfig;

/// File name of the per-user device cache.
pub const CACHE_FILE_NAME: &str = ".sparkrc";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Cloud base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Default auto-update interval in milliseconds.
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Device cache location; `~/.sparkrc` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout: default_timeout(),
            interval: default_interval(),
            cache_file: None,
        }
    }
}

fn default_api_url() -> String {
    spark_api::DEFAULT_BASE_URL.into()
}
fn default_timeout() -> u64 {
    30
}
fn default_interval() -> u64 {
    1000
}

impl Config {
    /// Resolved cache location.
    pub fn cache_path(&self) -> PathBuf {
        self.cache_file.clone().unwrap_or_else(default_cache_path)
    }

    /// Translate to the runtime configuration the core consumes.
    pub fn to_cloud_config(&self) -> Result<CloudConfig, ConfigError> {
        let url: url::Url = self.api_url.parse().map_err(|_| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL: {}", self.api_url),
        })?;

        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least one second".into(),
            });
        }

        if self.interval == 0 {
            return Err(ConfigError::Validation {
                field: "interval".into(),
                reason: "must be at least one millisecond".into(),
            });
        }

        Ok(CloudConfig {
            url,
            timeout: Duration::from_secs(self.timeout),
            poll_interval: Duration::from_millis(self.interval),
        })
    }
}

// ── Paths ───────────────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "spark", "spark").map_or_else(
        || home_dir().join(".config").join("spark").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// `~/.sparkrc`.
pub fn default_cache_path() -> PathBuf {
    home_dir().join(CACHE_FILE_NAME)
}

fn home_dir() -> PathBuf {
    BaseDirs::new().map_or_else(
        || PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into())),
        |dirs| dirs.home_dir().to_path_buf(),
    )
}

// ── Loading ────────────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    figment_at(&config_path()).extract().map_err(Into::into)
}

fn figment_at(path: &std::path::Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SPARK_"))
}
