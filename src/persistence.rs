//! Device persistence: a small key-value store for local state.
//!
//! The session controller uses it for the anonymous (onboarded) profile and
//! the onboarding-completed flag; the CLI also keeps its navigation snapshot,
//! the chat conversation and the demo identity store's state here.
//!
//! Two implementations:
//!
//! - [`FileStore`]: a JSON object in a single file, rewritten atomically
//! - [`MemoryStore`]: in-process map, for tests and embedding

use crate::error::{PromptlyError, Result};
use crate::fs::atomic_write_file;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Well-known keys.
pub mod keys {
    /// Set to `"true"` once onboarding has been completed on this device.
    pub const ONBOARDING_COMPLETED: &str = "promptly_onboarding_completed";
    /// JSON-encoded local (anonymous) profile.
    pub const LOCAL_USER: &str = "promptly_temp_user";
    /// JSON-encoded navigation snapshot between CLI invocations.
    pub const NAVIGATION: &str = "promptly_navigation";
    /// Remote store access token.
    pub const REMOTE_SESSION: &str = "promptly_remote_session";
    /// Demo identity store: account table.
    pub const DEMO_ACCOUNTS: &str = "promptly_demo_accounts";
    /// Demo identity store: signed-in account id.
    pub const DEMO_SESSION: &str = "promptly_demo_session";
    /// JSON-encoded chat conversation.
    pub const CHAT: &str = "promptly_chat";
}

/// Simple key-value persistence.
pub trait DevicePersistence: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Read a JSON-encoded value. A value that fails to decode is reported.
pub fn get_json<T: DeserializeOwned>(store: &dyn DevicePersistence, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
            PromptlyError::StorageError(format!("failed to decode '{}': {}", key, e))
        }),
        None => Ok(None),
    }
}

/// Store a value as JSON.
pub fn set_json<T: Serialize>(store: &dyn DevicePersistence, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| PromptlyError::StorageError(format!("failed to encode '{}': {}", key, e)))?;
    store.set(key, &raw)
}

/// Key-value store backed by one JSON file.
///
/// Every write rewrites the whole file atomically. A missing file reads as
/// empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            PromptlyError::StorageError(format!(
                "failed to read '{}': {}",
                self.path.display(),
                e
            ))
        })?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            PromptlyError::StorageError(format!(
                "failed to parse '{}': {}",
                self.path.display(),
                e
            ))
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| PromptlyError::StorageError(format!("failed to encode store: {}", e)))?;
        atomic_write_file(&self.path, &content)
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self.lock.lock().unwrap_or_else(|poison| poison.into_inner());
        let mut entries = self.read_all()?;
        if f(&mut entries) {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

impl DevicePersistence for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|poison| poison.into_inner());
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

/// In-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .contains_key(key)
    }
}

impl DevicePersistence for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|poison| poison.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|poison| poison.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|poison| poison.into_inner());
        entries.remove(key);
        Ok(())
    }
}
