//! Durable backends for the persisted snapshot blob.
//!
//! A backend stores one opaque text blob. It knows nothing about the
//! snapshot schema; encoding and validation happen in the [`Store`].
//!
//! [`Store`]: super::Store

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aichat_proto::snapshot::STORAGE_KEY;

/// Errors that can occur while reading or writing the snapshot blob.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The backend refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A single-blob durable store.
pub trait SnapshotStorage: Send {
    /// Reads the blob. `Ok(None)` means nothing has been written yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn read(&self) -> Result<Option<String>, StorageError>;

    /// Replaces the blob.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn write(&self, blob: &str) -> Result<(), StorageError>;

    /// Removes the blob. Clearing an empty backend is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be modified.
    fn clear(&self) -> Result<(), StorageError>;
}

impl<T: SnapshotStorage + ?Sized> SnapshotStorage for Box<T> {
    fn read(&self) -> Result<Option<String>, StorageError> {
        (**self).read()
    }

    fn write(&self, blob: &str) -> Result<(), StorageError> {
        (**self).write(blob)
    }

    fn clear(&self) -> Result<(), StorageError> {
        (**self).clear()
    }
}

/// In-memory backend. Clones share the same blob, so a test can keep a
/// handle while the store owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blob: Arc<parking_lot::Mutex<Option<String>>>,
}

impl MemoryStorage {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-filled with `blob`.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Arc::new(parking_lot::Mutex::new(Some(blob.into()))),
        }
    }

    /// Current blob contents.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.blob.lock().clone()
    }
}

impl SnapshotStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.blob.lock().clone())
    }

    fn write(&self, blob: &str) -> Result<(), StorageError> {
        *self.blob.lock() = Some(blob.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.blob.lock() = None;
        Ok(())
    }
}

/// JSON file backend.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write leaves the previous blob intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Creates a backend writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `<data dir>/aichat/aichat-storage.json`.
    ///
    /// Returns `None` if the platform has no data directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("aichat").join(format!("{STORAGE_KEY}.json")))
    }

    /// Path of the blob file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStorage for FileStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write(&self, blob: &str) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, blob).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
