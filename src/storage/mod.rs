//!
//! unisearch durable client storage
//! --------------------------------
//! Small synchronous key/value layer standing in for browser local storage.
//! Values are opaque strings (JSON documents in practice); the stores decide
//! their own encoding. Two backends are provided: `FileStorage`, one JSON file
//! per key under the configured data directory, and `MemoryStorage` for tests
//! and ephemeral sessions.
//!
//! Writes are synchronous and callers treat them as fire-and-forget: a failed
//! write is logged by the store and never rolls back in-memory state.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppResult;

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Persisted auth subset `{token, apiKey, username}`.
pub const AUTH_STORAGE_KEY: &str = "auth-storage";
/// JSON array of up to ten recent keywords.
pub const SEARCH_HISTORY_KEY: &str = "unisearch_search_history";
/// `"dark"` or `"light"`.
pub const THEME_KEY: &str = "theme";

pub trait DurableStorage: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> AppResult<()>;

    fn contains(&self, key: &str) -> AppResult<bool> { Ok(self.get(key)?.is_some()) }
}

pub type SharedStorage = Arc<dyn DurableStorage>;

/// Decode a JSON value stored under `key`. Missing keys yield `Ok(None)`.
pub fn read_json<T: DeserializeOwned>(storage: &dyn DurableStorage, key: &str) -> AppResult<Option<T>> {
    match storage.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn write_json<T: Serialize + ?Sized>(storage: &dyn DurableStorage, key: &str, value: &T) -> AppResult<()> {
    let raw = serde_json::to_string(value)?;
    storage.set(key, &raw)
}
