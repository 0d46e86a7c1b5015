//! Key-value storage backends.
//!
//! The browser original kept everything in local storage; here the same
//! handful of string keys sits behind the [`StorageBackend`] trait so the
//! repository can be exercised against an in-memory map in tests and a
//! file-per-key store in production.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, error, trace};
use tempfile::NamedTempFile;

use crate::{NoteError, Result};

/// Storage key holding the serialized note array.
pub const NOTES_KEY: &str = "little-notes";
/// Storage key holding user display settings.
pub const SETTINGS_KEY: &str = "userSettings";
/// Storage key holding background image settings.
pub const BACKGROUNDS_KEY: &str = "backgroundSettings";
/// Storage key holding the selected theme id (a bare string, not JSON).
pub const THEME_KEY: &str = "selectedTheme";

/// All keys the application owns, in clear-all order.
pub const ALL_KEYS: [&str; 4] = [NOTES_KEY, SETTINGS_KEY, BACKGROUNDS_KEY, THEME_KEY];

/// A synchronous string key-value store. Every value is written whole; there
/// is no partial update at this layer.
pub trait StorageBackend {
    /// Returns the stored value, or `None` when the key has never been set.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value under `key` atomically.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory backend for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| NoteError::StorageUnavailable {
                message: format!("memory backend poisoned: {}", e),
            })
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// File-backed store: one JSON document per key under the data directory.
///
/// Writes land in a temporary file in the same directory and are moved into
/// place with an atomic rename, so a crash mid-write never leaves a
/// half-serialized blob behind.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Opens the backend rooted at `dir`, creating the directory if needed.
    pub fn new(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            debug!("Data directory does not exist, creating: {}", dir.display());
            fs::create_dir_all(dir).map_err(|e| {
                error!("Failed to create data directory {}: {}", dir.display(), e);
                NoteError::StorageUnavailable {
                    message: format!("cannot create data directory {}: {}", dir.display(), e),
                }
            })?;
        }
        Ok(FileBackend {
            dir: dir.to_path_buf(),
        })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => {
                trace!("Read {} bytes from {}", value.len(), path.display());
                Ok(Some(value))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                Err(NoteError::Io(e))
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        trace!("Writing {} bytes to {}", value.len(), path.display());

        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            NoteError::Io(e)
        })?;
        temp_file.write_all(value.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            NoteError::Io(e)
        })?;
        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            NoteError::Io(e)
        })?;

        temp_file.persist(&path).map_err(|e| {
            error!("Failed to persist file {}: {}", path.display(), e.error);
            NoteError::Io(e.error)
        })?;

        debug!("Wrote storage key {} to {}", key, path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed storage key {} at {}", key, path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                error!("Failed to remove {}: {}", path.display(), e);
                Err(NoteError::Io(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_round_trips() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.read(NOTES_KEY).unwrap(), None);

        backend.write(NOTES_KEY, "[]").unwrap();
        assert_eq!(backend.read(NOTES_KEY).unwrap().as_deref(), Some("[]"));

        backend.remove(NOTES_KEY).unwrap();
        assert_eq!(backend.read(NOTES_KEY).unwrap(), None);
    }

    #[test]
    fn file_backend_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path()).unwrap();

        assert_eq!(backend.read(SETTINGS_KEY).unwrap(), None);
        backend.write(SETTINGS_KEY, r#"{"autoSave":true}"#).unwrap();
        assert_eq!(
            backend.read(SETTINGS_KEY).unwrap().as_deref(),
            Some(r#"{"autoSave":true}"#)
        );

        // Overwrite replaces the whole value.
        backend.write(SETTINGS_KEY, "{}").unwrap();
        assert_eq!(backend.read(SETTINGS_KEY).unwrap().as_deref(), Some("{}"));

        backend.remove(SETTINGS_KEY).unwrap();
        assert_eq!(backend.read(SETTINGS_KEY).unwrap(), None);
        // Removing again is fine.
        backend.remove(SETTINGS_KEY).unwrap();
    }

    #[test]
    fn file_backend_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deeper").join("data");
        let backend = FileBackend::new(&nested).unwrap();

        backend.write(THEME_KEY, "sakura").unwrap();
        assert_eq!(backend.read(THEME_KEY).unwrap().as_deref(), Some("sakura"));
        assert!(nested.join("selectedTheme.json").exists());
    }
}
