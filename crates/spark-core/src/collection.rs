// ── Device collection ──
//
// Every device reachable with one token. Enumeration failure is fatal;
// after that each device connects on its own and a device that fails to
// connect is recorded and skipped, never failing the whole collection.

use futures_util::future::join_all;
use secrecy::{ExposeSecret, SecretString};
use spark_api::CloudClient;
use tracing::{info, warn};

use crate::cache::{CacheEntry, CacheFile, CacheStore};
use crate::error::CoreError;
use crate::session::DeviceSession;

/// A device that was enumerated but could not be connected.
#[derive(Debug)]
pub struct DeviceFailure {
    pub id: String,
    pub name: Option<String>,
    pub error: CoreError,
}

/// Connected sessions for every device behind one token.
#[derive(Debug)]
pub struct DeviceCollection {
    cloud: CloudClient,
    sessions: Vec<DeviceSession>,
    failures: Vec<DeviceFailure>,
}

impl DeviceCollection {
    /// Enumerate the token's devices and connect a session for each.
    ///
    /// Sessions are connected concurrently and kept in enumeration order.
    pub async fn connect(cloud: CloudClient) -> Result<Self, CoreError> {
        let summaries = cloud.list_devices().await?;
        info!(devices = summaries.len(), "enumerated devices");

        let attempts = summaries.into_iter().map(|summary| {
            let session = DeviceSession::new(cloud.clone(), summary.id.clone());
            async move {
                match session.connect().await {
                    Ok(_) => Ok(session),
                    Err(error) => {
                        warn!(id = %summary.id, error = %error, "skipping device");
                        Err(DeviceFailure {
                            id: summary.id,
                            name: summary.name,
                            error,
                        })
                    }
                }
            }
        });

        let mut sessions = Vec::new();
        let mut failures = Vec::new();
        for outcome in join_all(attempts).await {
            match outcome {
                Ok(session) => sessions.push(session),
                Err(failure) => failures.push(failure),
            }
        }

        Ok(Self {
            cloud,
            sessions,
            failures,
        })
    }

    /// Successfully connected sessions.
    pub fn sessions(&self) -> &[DeviceSession] {
        &self.sessions
    }

    pub fn failures(&self) -> &[DeviceFailure] {
        &self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Find a connected session by name, then by id.
    pub fn get(&self, key: &str) -> Option<&DeviceSession> {
        self.sessions
            .iter()
            .find(|s| s.name() == Some(key))
            .or_else(|| self.sessions.iter().find(|s| s.id() == key))
    }

    pub fn token(&self) -> &SecretString {
        self.cloud.token()
    }

    /// Cache entries for the connected sessions only.
    pub fn cache_entries(&self) -> Vec<CacheEntry> {
        let token = self.token().expose_secret();
        self.sessions
            .iter()
            .map(|s| CacheEntry {
                name: s.name().unwrap_or_else(|| s.id()).to_owned(),
                id: s.id().to_owned(),
                token: token.to_owned(),
            })
            .collect()
    }

    /// Replace the cache contents with this collection's devices.
    pub fn persist(&self, store: &CacheStore) -> Result<CacheFile, CoreError> {
        let file = CacheFile::from_entries(self.cache_entries());
        store.save(&file)?;
        info!(
            path = %store.path().display(),
            devices = file.by_id.len(),
            "device cache saved"
        );
        Ok(file)
    }
}
