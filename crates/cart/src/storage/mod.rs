//! Durable local cart persistence.
//!
//! The engine writes the cart snapshot after every mutation so a guest cart
//! survives process restarts. Storage is the local-storage equivalent of the
//! browser world: one JSON record under a fixed location, whose absence is
//! equivalent to an empty guest cart.
//!
//! The trait is synchronous on purpose - local mutations must complete
//! without suspension points, so persistence cannot await.

mod json_file;
mod memory;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bramble_core::LineItem;

/// Errors from the local persistence layer.
///
/// These never propagate out of cart mutations; the engine logs them and
/// keeps going with its in-memory state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing store failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding the cart snapshot failed.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The persisted cart record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCart {
    /// Cart lines in insertion order.
    pub items: Vec<LineItem>,
    /// When the snapshot was written. Informational only; reconciliation is
    /// always pull-wins, never timestamp-based.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl StoredCart {
    /// Snapshot the given lines with the current timestamp.
    #[must_use]
    pub fn new(items: Vec<LineItem>) -> Self {
        Self {
            items,
            updated_at: Utc::now(),
        }
    }
}

/// Local persistent storage for the cart snapshot.
pub trait CartStorage: Send + Sync {
    /// Load the stored cart. `None` means no record exists (empty guest
    /// cart). Implementations treat an unreadable record as absent rather
    /// than failing the session.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store itself cannot be read.
    fn load(&self) -> Result<Option<StoredCart>, StorageError>;

    /// Persist the cart snapshot, replacing any prior record.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the snapshot cannot be written.
    fn save(&self, cart: &StoredCart) -> Result<(), StorageError>;
}
