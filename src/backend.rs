//! Synchronous string key-value backends the preference store runs on.
//!
//! SYSTEM CONTEXT
//! ==============
//! The browser's `localStorage` is the production backend. It can be missing
//! (non-browser host), disabled (privacy mode), or throw on access (quota),
//! so every call is fallible and the store turns any failure into
//! "storage unavailable" instead of surfacing backend detail.
//!
//! TRADE-OFFS
//! ==========
//! Backends carry no locking across calls. Two writers (tabs) doing
//! read-modify-write can clobber each other; that is accepted.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

/// Failure reported by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No storage exists in this host (no window, no `localStorage`).
    #[error("storage is not present in this environment")]
    Missing,
    /// The storage exists but refused the operation.
    #[error("storage rejected the operation: {0}")]
    Rejected(String),
    /// File-backed storage could not read or write its file.
    #[error("storage file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Minimal synchronous string store, shaped like the Web Storage API.
pub trait StorageBackend {
    /// Read the value stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the backend cannot be accessed.
    fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Store `value` at `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the backend cannot be accessed.
    fn set(&self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Delete `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the backend cannot be accessed.
    fn remove(&self, key: &str) -> Result<(), BackendError>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for &T {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        (**self).remove(key)
    }
}

impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        (**self).remove(key)
    }
}

// =============================================================================
// MEMORY
// =============================================================================

/// In-process backend for tests and server-side rendering.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_entries<R>(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> R) -> Result<R, BackendError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| BackendError::Rejected("memory storage lock poisoned".into()))?;
        Ok(f(&mut entries))
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        self.with_entries(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.with_entries(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.with_entries(|entries| {
            entries.remove(key);
        })
    }
}

// =============================================================================
// UNAVAILABLE
// =============================================================================

/// Backend for hosts without storage; every call fails with [`BackendError::Missing`].
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableStorage;

impl StorageBackend for UnavailableStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, BackendError> {
        Err(BackendError::Missing)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), BackendError> {
        Err(BackendError::Missing)
    }

    fn remove(&self, _key: &str) -> Result<(), BackendError> {
        Err(BackendError::Missing)
    }
}

// =============================================================================
// BROWSER
// =============================================================================

/// `window.localStorage`, looked up on every call.
///
/// Holding no JS handle keeps this type `Send + Sync`, so a store built on it
/// can sit in Leptos context.
#[cfg(feature = "hydrate")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStorage;

#[cfg(feature = "hydrate")]
impl BrowserStorage {
    fn storage() -> Result<web_sys::Storage, BackendError> {
        let window = web_sys::window().ok_or(BackendError::Missing)?;
        window
            .local_storage()
            .map_err(|e| BackendError::Rejected(js_error_text(&e)))?
            .ok_or(BackendError::Missing)
    }
}

#[cfg(feature = "hydrate")]
fn js_error_text(value: &wasm_bindgen::JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

#[cfg(feature = "hydrate")]
impl StorageBackend for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| BackendError::Rejected(js_error_text(&e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| BackendError::Rejected(js_error_text(&e)))
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| BackendError::Rejected(js_error_text(&e)))
    }
}

// =============================================================================
// FILE
// =============================================================================

/// All keys kept in one JSON object file, for native hosts and the CLI.
///
/// The file is re-read on every call so external edits are picked up. A
/// missing file reads as empty; the parent directory must exist for writes.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStorage {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, BackendError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| BackendError::Rejected(format!("corrupt storage file: {e}")))
    }

    fn store(&self, entries: &BTreeMap<String, String>) -> Result<(), BackendError> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| BackendError::Rejected(format!("encode storage file: {e}")))?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut entries = self.load()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.store(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.store(&entries)?;
        }
        Ok(())
    }
}
