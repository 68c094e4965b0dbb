//! In-memory cart storage for ephemeral sessions and tests.

use std::sync::Mutex;

use super::{CartStorage, StorageError, StoredCart};

/// Storage that keeps the cart snapshot in process memory only.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    record: Mutex<Option<StoredCart>>,
}

impl MemoryStorage {
    /// New empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with an existing record (restores a prior session).
    #[must_use]
    pub fn with_record(record: StoredCart) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Option<StoredCart>, StorageError> {
        Ok(self
            .record
            .lock()
            .map_or(None, |record| record.clone()))
    }

    fn save(&self, cart: &StoredCart) -> Result<(), StorageError> {
        if let Ok(mut record) = self.record.lock() {
            *record = Some(cart.clone());
        }
        Ok(())
    }
}
