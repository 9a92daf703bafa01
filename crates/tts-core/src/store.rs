//! Persisted key-value storage
//!
//! The core only needs string get/set against a host-scoped store (userscript
//! storage, `localStorage`, a JSON file). Hosts implement [`KvStore`].

use std::collections::HashMap;

/// Error type for storage access.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage write failed for '{key}': {reason}")]
    WriteFailed { key: String, reason: String },
    #[error("Invalid value for '{key}': {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Host-provided string key-value store.
pub trait KvStore {
    /// Read a value. `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Read a value, falling back to `default` when unset.
    fn get_or(&self, key: &str, default: &str) -> Result<String, StoreError> {
        Ok(self.get(key)?.unwrap_or_else(|| default.to_string()))
    }
}

/// Read a stringified unsigned integer, treating a missing key as `0`.
pub fn get_u64<S: KvStore + ?Sized>(store: &S, key: &str) -> Result<u64, StoreError> {
    let value = store.get_or(key, "0")?;
    value.trim().parse().map_err(|_| StoreError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

// =============================================================================
// Scoped Keys
// =============================================================================

/// The three keys the stripper persists.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageKeys {
    pub redirect_count: String,
    pub last_redirect: String,
    pub error_log: String,
}

impl StorageKeys {
    /// Build keys under a common prefix.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            redirect_count: format!("{prefix}redirect_count"),
            last_redirect: format!("{prefix}last_redirect"),
            error_log: format!("{prefix}error_log"),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_prefix("tts_")
    }
}

// =============================================================================
// In-memory Store
// =============================================================================

/// Volatile store for tests and one-shot tools.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
