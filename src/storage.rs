//! Persistent key-value storage backing the session store.
//!
//! DESIGN
//! ======
//! The trait mirrors the browser `localStorage` surface (`getItem`,
//! `setItem`, `removeItem`). Operations are infallible from the caller's
//! point of view: a backend that cannot read treats the key as absent, and
//! a backend that cannot write logs a warning. The session store relies on
//! this to stay a total function over its inputs.
//!
//! Every mutation is committed before the call returns, so state written
//! immediately before a crash is observed on the next start.

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Storage key holding the bearer credential.
pub const TOKEN_KEY: &str = "authToken";
/// Storage key holding the principal (display) name.
pub const USERNAME_KEY: &str = "username";

/// Synchronous string key-value store that survives process restarts.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value. Absence is `None`, never an error.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one.
    fn set_item(&self, key: &str, value: &str);

    /// Remove a value. Removing a missing key is a no-op.
    fn remove_item(&self, key: &str);
}

// =============================================================================
// MEMORY
// =============================================================================

/// In-memory storage. Clones share the same map, so a clone handed to a
/// fresh `SessionStore` behaves like the same storage after a reload.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    items: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove_item(&self, key: &str) {
        self.items.write().unwrap_or_else(PoisonError::into_inner).remove(key);
    }
}

// =============================================================================
// FILE
// =============================================================================

/// Storage persisted as a flat JSON object in a single file.
///
/// Each mutation re-reads the file, applies the change, and atomically
/// replaces it (temp file + rename). The file is the only source of truth;
/// nothing is cached between calls.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session file unreadable; treating as empty");
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "session file corrupt; treating as empty");
            BTreeMap::new()
        })
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(items).map_err(std::io::Error::other)?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)
    }

    /// Sibling temp file: the full file name plus `.tmp`, so files that
    /// differ only by extension never share one.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn mutate(&self, apply: impl FnOnce(&mut BTreeMap<String, String>) -> bool) {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut items = self.read_all();
        if !apply(&mut items) {
            return;
        }
        if let Err(e) = self.write_all(&items) {
            tracing::warn!(path = %self.path.display(), error = %e, "session file write failed");
        }
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn set_item(&self, key: &str, value: &str) {
        self.mutate(|items| {
            items.insert(key.to_owned(), value.to_owned());
            true
        });
    }

    fn remove_item(&self, key: &str) {
        self.mutate(|items| items.remove(key).is_some());
    }
}

// =============================================================================
// BROWSER
// =============================================================================

/// Log a failed `localStorage` call. Returns whether the call succeeded.
#[cfg_attr(not(feature = "hydrate"), allow(dead_code))]
fn log_browser_failure<E: std::fmt::Debug>(op: &str, key: &str, result: Result<(), E>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(op, key, error = ?e, "localStorage call failed");
            false
        }
    }
}

/// `window.localStorage`. Looked up on every call so the type stays
/// `Send + Sync`; a missing window or storage reads as empty.
#[cfg(feature = "hydrate")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStorage;

#[cfg(feature = "hydrate")]
impl BrowserStorage {
    fn local_storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

#[cfg(feature = "hydrate")]
impl KeyValueStorage for BrowserStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        Self::local_storage()?.get_item(key).ok().flatten()
    }

    fn set_item(&self, key: &str, value: &str) {
        if let Some(storage) = Self::local_storage() {
            log_browser_failure("set", key, storage.set_item(key, value));
        }
    }

    fn remove_item(&self, key: &str) {
        if let Some(storage) = Self::local_storage() {
            log_browser_failure("remove", key, storage.remove_item(key));
        }
    }
}
