use std::sync::Arc;
use tracing::warn;

use crate::error::PersistenceError;
use crate::storage::{load_or, save_value, KvStore};

pub const CYCLES_KEY: &str = "cyclesCompleted";

/// Persisted count of completed focus cycles.
pub struct CycleCounter {
    store: Arc<dyn KvStore>,
}

impl CycleCounter {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Stored count, or 0 if it is missing or not a non-negative integer.
    pub fn load(&self) -> u64 {
        load_or(self.store.as_ref(), CYCLES_KEY, 0)
    }

    pub fn save(&self, cycles: u64) {
        if let Err(e) = self.try_save(cycles) {
            warn!(error = %e, cycles, "failed to persist cycle count");
        }
    }

    /// # Errors
    /// Returns the store's error if the count could not be written.
    pub fn try_save(&self, cycles: u64) -> Result<(), PersistenceError> {
        save_value(self.store.as_ref(), CYCLES_KEY, &cycles)
    }

    /// Set the count back to zero, reporting a failed write.
    ///
    /// # Errors
    /// Returns the store's error if the count could not be written.
    pub fn reset(&self) -> Result<(), PersistenceError> {
        self.try_save(0)
    }
}
