// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Durable keyed storage
//!
//! The engine persists three independent JSON blobs (session identifier,
//! message history, study session log). Every store receives a [`Storage`]
//! handle instead of touching the filesystem directly, so tests can swap in
//! [`MemoryStorage`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StudyChatError};

/// Key for the persisted session identifier
pub const SESSION_ID_KEY: &str = "session_id";
/// Key for the bounded message history
pub const HISTORY_KEY: &str = "history";
/// Key for the finalized study session log
pub const STUDY_SESSIONS_KEY: &str = "study_sessions";

/// A keyed blob store with explicit load/save/clear lifecycle
pub trait Storage: Send + Sync {
    /// Read the blob stored under `key`, if any
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob stored under `key`
    fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the blob stored under `key`; missing keys are not an error
    fn clear(&self, key: &str) -> Result<()>;
}

/// Load and deserialize a JSON blob.
pub fn load_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Result<Option<T>> {
    match storage.load(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize and save a JSON blob.
pub fn save_json<T: Serialize + ?Sized>(storage: &dyn Storage, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    storage.save(key, &raw)
}

/// One JSON file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open a file store, or fall back to memory when the directory is unusable.
    pub fn open_or_memory(dir: impl Into<PathBuf>) -> Arc<dyn Storage> {
        let dir = dir.into();
        match Self::open(&dir) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::warn!(
                    "Durable storage unavailable at {}: {}; keeping data in memory only",
                    dir.display(),
                    e
                );
                Arc::new(MemoryStorage::new())
            }
        }
    }

    /// Directory backing this store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(StudyChatError::Storage(format!("invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        // Write to a sibling temp file first so a crash never leaves half a blob.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store used by tests and as the degraded fallback
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn blobs(&self) -> MutexGuard<'_, HashMap<String, String>> {
        match self.blobs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Memory storage lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.blobs().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.blobs().remove(key);
        Ok(())
    }
}

/// A store whose every operation fails, for exercising degraded paths
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStorage;

impl Storage for UnavailableStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Err(StudyChatError::Storage(format!("cannot read '{}': storage unavailable", key)))
    }

    fn save(&self, key: &str, _value: &str) -> Result<()> {
        Err(StudyChatError::Storage(format!("cannot write '{}': storage unavailable", key)))
    }

    fn clear(&self, key: &str) -> Result<()> {
        Err(StudyChatError::Storage(format!("cannot clear '{}': storage unavailable", key)))
    }
}
