//! In-process key-value store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::KvStore;
use crate::error::PersistenceError;

/// A `HashMap` behind a mutex. Can be switched unavailable to simulate a
/// storage outage.
#[derive(Debug)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, PersistenceError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("memory store disabled".into()));
        }
        self.values
            .lock()
            .map_err(|_| PersistenceError::Unavailable("memory store lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.guard()?.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.guard()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.guard()?.remove(key);
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
