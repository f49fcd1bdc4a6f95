//! CLI configuration: thin wrapper around `spark_config` shared types.
//!
//! Applies `GlobalOpts` flag overrides (--api-url, --timeout, --cache-file)
//! on top of the layered config. Core never sees these types.

use spark_core::{CacheStore, CloudConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use spark_config::{Config, load_config};

/// Everything a command needs to talk to the cloud.
#[derive(Debug)]
pub struct Resolved {
    pub cloud: CloudConfig,
    pub cache: CacheStore,
}

/// Merge flags over the loaded config. Flags win.
pub fn apply_overrides(mut cfg: Config, global: &GlobalOpts) -> Config {
    if let Some(ref url) = global.api_url {
        cfg.api_url.clone_from(url);
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }
    if let Some(ref path) = global.cache_file {
        cfg.cache_file = Some(path.clone());
    }
    cfg
}

/// Load config from disk and env, apply flags, and build runtime settings.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = apply_overrides(load_config()?, global);
    tracing::debug!(api_url = %cfg.api_url, timeout = cfg.timeout, "resolved configuration");

    Ok(Resolved {
        cloud: cfg.to_cloud_config()?,
        cache: CacheStore::new(cfg.cache_path()),
    })
}
