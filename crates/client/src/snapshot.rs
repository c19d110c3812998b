//! Durable key/value snapshot of session data.
//!
//! The session store keeps two entries here: the bearer token and the
//! serialized current user. Values are opaque strings.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;

/// Key of the bearer token entry.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Key of the serialized user entry.
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Errors from reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// A durable string-to-string store.
pub trait SnapshotStore: Send + Sync {
    /// Read one entry.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, SnapshotError>;

    /// Write one entry, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), SnapshotError>;

    /// Write several entries as one update: either all land or none do.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the backing storage cannot be written, in
    /// which case no entry has changed.
    fn set_many(&self, updates: &[(&str, &str)]) -> Result<(), SnapshotError>;

    /// Delete one entry. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), SnapshotError>;
}

// =============================================================================
// File store
// =============================================================================

/// Snapshot kept as a JSON object in a single file.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash never leaves a half-written snapshot behind.
#[derive(Debug)]
pub struct FileSnapshotStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSnapshotStore {
    /// Store backed by the file at `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SnapshotError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn get(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SnapshotError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn set_many(&self, updates: &[(&str, &str)]) -> Result<(), SnapshotError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_all()?;
        for (key, value) in updates {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), SnapshotError> {
        let _guard = self.lock.lock();
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            // An unreadable snapshot is replaced rather than blocking removal.
            Err(SnapshotError::Encoding(_)) => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        let removed = entries.remove(key).is_some();

        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            };
        }
        if removed {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

// =============================================================================
// Memory store
// =============================================================================

/// Snapshot kept in process memory only.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn get(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SnapshotError> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_many(&self, updates: &[(&str, &str)]) -> Result<(), SnapshotError> {
        let mut entries = self.entries.lock();
        for (key, value) in updates {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SnapshotError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
