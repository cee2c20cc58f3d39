//! Key-value persistence.
//!
//! The timer core only ever talks to storage through [`KvStore`]: values are
//! JSON text under a string key. [`load_or`] and [`save_value`] layer typed
//! access with a default-on-failure policy on top of it.

pub mod database;
pub mod memory;
mod settings;

pub use database::SqliteStore;
pub use memory::MemoryStore;
pub use settings::AppSettings;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::{PersistenceError, SettingsError};

/// Port for simple key-value storage of serialized values.
pub trait KvStore: Send + Sync {
    /// Raw value stored under `key`, or `None` on a miss.
    fn get_raw(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_raw(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Delete `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;

    fn is_available(&self) -> bool;
}

/// Load and decode `key`, distinguishing a miss from a failure.
///
/// # Errors
/// Returns an error if the store fails or the stored value does not decode as `T`.
pub fn try_load<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    match store.get_raw(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| PersistenceError::Serialization {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Load `key`, returning `default` on a miss or on any failure.
pub fn load_or<T: DeserializeOwned>(store: &dyn KvStore, key: &str, default: T) -> T {
    match try_load(store, key) {
        Ok(Some(value)) => value,
        Ok(None) => {
            debug!(key, "no stored value, using default");
            default
        }
        Err(e) => {
            warn!(key, error = %e, "failed to load stored value, using default");
            default
        }
    }
}

/// Encode and store `value` under `key`.
///
/// # Errors
/// Returns an error if encoding fails or the store rejects the write.
pub fn save_value<T: Serialize + ?Sized>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
) -> Result<(), PersistenceError> {
    let raw = serde_json::to_string(value).map_err(|source| PersistenceError::Serialization {
        key: key.to_string(),
        source,
    })?;
    store.set_raw(key, &raw)
}

/// Returns `~/.config/focusdesk[-dev]/`, or `$FOCUSDESK_HOME` when set.
///
/// Set FOCUSDESK_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, SettingsError> {
    let dir = match std::env::var_os("FOCUSDESK_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSDESK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusdesk-dev")
            } else {
                base_dir.join("focusdesk")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(SettingsError::DataDir)?;
    Ok(dir)
}
