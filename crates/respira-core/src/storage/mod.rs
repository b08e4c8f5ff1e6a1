mod config;
pub mod database;
mod memory;

pub use config::{Config, SessionConfig, StorageConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

/// Persisted key for the user-authored programs.
pub const CUSTOM_PROGRAMS_KEY: &str = "programs.custom";
/// Persisted key for the active-program reference.
pub const ACTIVE_PROGRAM_KEY: &str = "programs.active";
/// Persisted key for the ids of built-ins the user deleted.
pub const HIDDEN_BUILTINS_KEY: &str = "programs.hidden_builtins";
/// Persisted key for the session history.
pub const SESSION_HISTORY_KEY: &str = "sessions.history";

/// Minimal string key-value store the program catalog and session history
/// persist through. Values are JSON documents.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Returns `~/.config/respira[-dev]/` based on RESPIRA_ENV.
///
/// Set RESPIRA_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("RESPIRA_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("respira-dev")
    } else {
        base_dir.join("respira")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(e.to_string()))?;
    Ok(dir)
}

/// Read and decode a JSON value. Missing keys, read failures and decode
/// failures all yield `None`; the latter two are logged.
pub(crate) fn load_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read persisted value");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding undecodable persisted value");
            None
        }
    }
}

/// Encode and write a JSON value. Failures are logged and swallowed; the
/// caller's in-memory state stays authoritative.
pub(crate) fn save_json<T: Serialize + ?Sized>(store: &dyn KvStore, key: &str, value: &T) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to encode value for persistence");
            return;
        }
    };
    if let Err(e) = store.set(key, &json) {
        tracing::warn!(key, error = %e, "failed to persist value");
    }
}

pub(crate) fn remove_key(store: &dyn KvStore, key: &str) {
    if let Err(e) = store.remove(key) {
        tracing::warn!(key, error = %e, "failed to remove persisted value");
    }
}
