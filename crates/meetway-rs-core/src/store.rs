//! Durable key-value stores backing the persistent cache provider.
//!
//! The store is deliberately dumb: raw string blobs in, raw string blobs
//! out. Record decoding and TTL policy live in the cache provider so a
//! corrupt blob is the provider's recovery case, not a store failure.

use directories::ProjectDirs;
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors returned by the backing stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Durable key-value blob store, scoped to one browsing context.
pub trait InfoStore: Send + Sync {
    /// Load the blob for a key, `None` when the slot is empty.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Write the blob for a key.
    fn save(&self, key: &str, blob: &str) -> Result<(), StoreError>;
    /// Empty the slot for a key. Clearing an empty slot is not an error.
    fn clear(&self, key: &str) -> Result<(), StoreError>;
}

/// File-backed store keeping one `<key>.json` file per slot.
#[derive(Debug)]
pub struct FileInfoStore {
    /// Root directory for slot files.
    root: PathBuf,
    /// Serialize write access to slot files.
    write_lock: Mutex<()>,
}

impl FileInfoStore {
    /// Create a new file-backed store under the given root.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("initialized file info store (root={})", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Path to a slot file.
    fn slot_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Path to the temporary slot file used for atomic writes.
    fn temp_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json.tmp"))
    }
}

impl InfoStore for FileInfoStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Replace the slot atomically via a temp file rename.
    fn save(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let path = self.slot_path(key);
        let temp_path = self.temp_path(key);
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            file.write_all(blob.as_bytes())?;
        }
        fs::rename(temp_path, path)?;
        debug!("saved store slot (key={key}, len={})", blob.len());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        match fs::remove_file(self.slot_path(key)) {
            Ok(()) => {
                debug!("cleared store slot (key={key})");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-process store for embedding without a filesystem, and for tests.
#[derive(Debug, Default)]
pub struct MemoryInfoStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InfoStore for MemoryInfoStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Platform default root for the file store.
pub fn default_store_root() -> Option<PathBuf> {
    ProjectDirs::from("", "", "meetway").map(|dirs| dirs.data_dir().join("widget"))
}

#[cfg(test)]
mod tests {
    use super::{FileInfoStore, InfoStore, MemoryInfoStore};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn file_store_round_trips_blobs() {
        let temp = tempdir().expect("tempdir");
        let store = FileInfoStore::new(temp.path()).expect("store");

        assert_eq!(store.load("meetway_event_info").expect("load"), None);
        store
            .save("meetway_event_info", r#"{"name":"Jazz Night"}"#)
            .expect("save");
        assert_eq!(
            store.load("meetway_event_info").expect("load"),
            Some(r#"{"name":"Jazz Night"}"#.to_string())
        );

        store.clear("meetway_event_info").expect("clear");
        assert_eq!(store.load("meetway_event_info").expect("load"), None);
        // Clearing again stays quiet.
        store.clear("meetway_event_info").expect("clear twice");
    }

    #[test]
    fn file_store_overwrites_in_place() {
        let temp = tempdir().expect("tempdir");
        let store = FileInfoStore::new(temp.path()).expect("store");
        store.save("slot", "first").expect("save");
        store.save("slot", "second").expect("save");
        assert_eq!(store.load("slot").expect("load"), Some("second".to_string()));
    }

    #[test]
    fn memory_store_round_trips_blobs() {
        let store = MemoryInfoStore::default();
        store.save("slot", "value").expect("save");
        assert_eq!(store.load("slot").expect("load"), Some("value".to_string()));
        store.clear("slot").expect("clear");
        assert_eq!(store.load("slot").expect("load"), None);
    }
}
