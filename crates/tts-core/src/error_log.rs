//! Persisted diagnostic error log
//!
//! A capped JSON array of recent failures kept in the host store. The
//! stripper only ever appends; hosts may read it back for diagnostics.

use serde::{Deserialize, Serialize};

use crate::clock::format_timestamp;
use crate::store::{KvStore, StoreError};

/// Default number of entries kept.
pub const ERROR_LOG_CAPACITY: usize = 50;

/// One recorded failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogEntry {
    /// RFC 3339 UTC timestamp
    pub timestamp: String,
    pub error: String,
    pub url: String,
    pub user_agent: String,
}

impl ErrorLogEntry {
    pub fn new(now_ms: u64, error: impl Into<String>, url: &str, user_agent: &str) -> Self {
        Self {
            timestamp: format_timestamp(now_ms),
            error: error.into(),
            url: url.to_string(),
            user_agent: user_agent.to_string(),
        }
    }
}

/// Read the stored log. A missing key is an empty log.
pub fn read_error_log<S: KvStore + ?Sized>(store: &S, key: &str) -> Result<Vec<ErrorLogEntry>, StoreError> {
    let raw = store.get_or(key, "[]")?;
    Ok(serde_json::from_str(&raw)?)
}

/// Append `entry`, evicting the oldest entries beyond `capacity`.
pub fn append_error<S: KvStore + ?Sized>(
    store: &mut S,
    key: &str,
    entry: ErrorLogEntry,
    capacity: usize,
) -> Result<(), StoreError> {
    let mut entries = read_error_log(store, key)?;
    entries.push(entry);
    if entries.len() > capacity {
        let excess = entries.len() - capacity;
        entries.drain(..excess);
    }
    store.set(key, &serde_json::to_string(&entries)?)
}

/// Best-effort [`append_error`]: storage failures are logged and dropped.
pub fn record_error<S: KvStore + ?Sized>(store: &mut S, key: &str, entry: ErrorLogEntry, capacity: usize) {
    if let Err(e) = append_error(store, key, entry, capacity) {
        log::error!("Failed to log error to storage: {e}");
    }
}
