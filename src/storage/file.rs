//! JSON-file-backed key-value store.
//!
//! All entries live in a single flat JSON object of string keys to string
//! values. The whole object is rewritten on every change via a temporary file
//! and a rename, so a crash never leaves a half-written file behind.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use super::error::StorageError;
use super::KeyValueStore;

/// File name used inside the data directory.
pub const STORAGE_FILE_NAME: &str = "storage.json";

/// Persistent store backed by a JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`.
    ///
    /// A missing file is treated as an empty store. A file that cannot be
    /// parsed is logged and also treated as empty; it is overwritten on the
    /// next change.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => parse_entries(&path, &contents),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No storage file at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(source) => return Err(StorageError::Read { path, source }),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Opens `storage.json` inside `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be read.
    pub fn open_in_dir(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| StorageError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        Self::open(dir.join(STORAGE_FILE_NAME))
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, json).map_err(|source| StorageError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn parse_entries(path: &Path, contents: &str) -> BTreeMap<String, String> {
    if contents.trim().is_empty() {
        return BTreeMap::new();
    }
    match serde_json::from_str(contents) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                "Storage file {} is malformed, starting empty: {}",
                path.display(),
                e
            );
            BTreeMap::new()
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        if entries.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        let mut updated = entries.clone();
        updated.insert(key.to_string(), value.to_string());
        self.persist(&updated)?;
        *entries = updated;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut updated = entries.clone();
        updated.remove(key);
        self.persist(&updated)?;
        *entries = updated;
        Ok(())
    }
}
