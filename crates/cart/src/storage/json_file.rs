//! JSON-file cart storage.
//!
//! One pretty-printed JSON record per session at a fixed path. Writes go to
//! a temp file in the same directory followed by a rename, so a crash
//! mid-write can never corrupt the previous snapshot.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::warn;

use super::{CartStorage, StorageError, StoredCart};

/// Cart storage backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Storage at the given path. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut path = self.path.clone().into_os_string();
        path.push(".tmp");
        PathBuf::from(path)
    }
}

impl CartStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<StoredCart>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(e)),
        };

        match serde_json::from_str::<StoredCart>(&contents) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                // A corrupt snapshot must not take the session down; start
                // from an empty cart and let the next save overwrite it.
                warn!(path = %self.path.display(), error = %e, "unreadable cart snapshot, treating as absent");
                Ok(None)
            }
        }
    }

    fn save(&self, cart: &StoredCart) -> Result<(), StorageError> {
        let encoded = serde_json::to_vec_pretty(cart)?;
        let temp = self.temp_path();
        fs::write(&temp, &encoded)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}
