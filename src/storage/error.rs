//! Storage error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the key-value storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to read the backing file.
    #[error("failed to read storage file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the backing file.
    #[error("failed to write storage file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize the stored entries.
    #[error("failed to serialize storage: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A previous writer panicked while holding the store lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

impl StorageError {
    /// Returns true if this error came from the filesystem.
    #[must_use]
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Write { .. })
    }
}
