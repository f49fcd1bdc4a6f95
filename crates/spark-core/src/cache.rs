// ── Device cache ──
//
// The flat JSON file that maps device names and ids to tokens, so later
// invocations can open a session from a name alone. The core never picks
// the path itself; callers hand a `CacheStore` in.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;

/// One known device, as seen through either index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CacheEntry {
    pub name: String,
    pub id: String,
    pub token: String,
}

/// `byName` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    pub token: String,
    pub id: String,
}

/// `byId` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRecord {
    pub token: String,
    pub name: String,
}

/// On-disk document: `{ "byName": {...}, "byId": {...} }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheFile {
    #[serde(default)]
    pub by_name: BTreeMap<String, NameRecord>,
    #[serde(default)]
    pub by_id: BTreeMap<String, IdRecord>,
}

impl CacheFile {
    pub fn from_entries(entries: impl IntoIterator<Item = CacheEntry>) -> Self {
        let mut file = Self::default();
        for entry in entries {
            file.insert(entry);
        }
        file
    }

    /// Insert or replace an entry.
    ///
    /// An id is only ever stored once: re-inserting it replaces its token
    /// and drops the name index entry left over from a rename.
    pub fn insert(&mut self, entry: CacheEntry) {
        if let Some(previous) = self.by_id.remove(&entry.id) {
            let stale = self
                .by_name
                .get(&previous.name)
                .is_some_and(|r| r.id == entry.id);
            if stale {
                self.by_name.remove(&previous.name);
            }
        }

        self.by_name.insert(
            entry.name.clone(),
            NameRecord {
                token: entry.token.clone(),
                id: entry.id.clone(),
            },
        );
        self.by_id.insert(
            entry.id,
            IdRecord {
                token: entry.token,
                name: entry.name,
            },
        );
    }

    /// Resolve a device by name first, then by id.
    pub fn lookup(&self, key: &str) -> Option<CacheEntry> {
        if let Some(r) = self.by_name.get(key) {
            return Some(CacheEntry {
                name: key.to_owned(),
                id: r.id.clone(),
                token: r.token.clone(),
            });
        }
        self.by_id.get(key).map(|r| CacheEntry {
            name: r.name.clone(),
            id: key.to_owned(),
            token: r.token.clone(),
        })
    }

    /// Every device, ordered by id.
    pub fn entries(&self) -> Vec<CacheEntry> {
        self.by_id
            .iter()
            .map(|(id, r)| CacheEntry {
                name: r.name.clone(),
                id: id.clone(),
                token: r.token.clone(),
            })
            .collect()
    }
}

/// A cache file at an explicit path.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cache. `Ok(None)` means no device has been added yet.
    pub fn load(&self) -> Result<Option<CacheFile>, CoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no device cache yet");
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| self.error(&e))?;
        let file = serde_json::from_str(&contents).map_err(|e| self.error(&e))?;
        Ok(Some(file))
    }

    /// Overwrite the cache with `file`. Last writer wins.
    pub fn save(&self, file: &CacheFile) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.error(&e))?;
        }
        let json = serde_json::to_string_pretty(file).map_err(|e| self.error(&e))?;
        std::fs::write(&self.path, json).map_err(|e| self.error(&e))?;
        debug!(path = %self.path.display(), devices = file.by_id.len(), "device cache written");
        Ok(())
    }

    fn error(&self, err: &dyn std::fmt::Display) -> CoreError {
        CoreError::Cache {
            path: self.path.display().to_string(),
            message: err.to_string(),
        }
    }
}
