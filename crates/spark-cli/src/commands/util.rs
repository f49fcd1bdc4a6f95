//! Shared helpers for command handlers.

use secrecy::SecretString;
use spark_core::{CacheEntry, DeviceSession};

use crate::config::Resolved;
use crate::error::CliError;

/// Resolve a device (name first, then id) from the cache.
pub fn lookup_device(resolved: &Resolved, key: &str) -> Result<CacheEntry, CliError> {
    let cache = resolved.cache.load()?.ok_or_else(|| CliError::NoDevices {
        path: resolved.cache.path().display().to_string(),
    })?;
    cache.lookup(key).ok_or_else(|| CliError::UnknownDevice {
        identifier: key.to_owned(),
    })
}

/// Look a device up in the cache and connect a session to it.
pub async fn open_session(resolved: &Resolved, key: &str) -> Result<DeviceSession, CliError> {
    let entry = lookup_device(resolved, key)?;
    tracing::debug!(device = key, id = %entry.id, "opening session from cache");

    let cloud = resolved.cloud.client(SecretString::from(entry.token))?;
    Ok(DeviceSession::open(cloud, entry.id).await?)
}
