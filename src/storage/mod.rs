//! Persistent key-value storage.
//!
//! The timer persists everything as strings under fixed keys, the same model
//! as browser local storage. Two backends are provided:
//!
//! - [`FileStore`]: a JSON file in the user's data directory
//! - [`MemoryStore`]: volatile, for tests
//!
//! Readers must tolerate missing keys (first run) and malformed values
//! (corrupted or foreign data); see [`read_parsed`].

mod error;
mod file;
mod memory;

use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, warn};

pub use error::StorageError;
pub use file::{FileStore, STORAGE_FILE_NAME};
pub use memory::MemoryStore;

/// Key holding the JSON duration configuration.
pub const DURATIONS_KEY: &str = "pomodoro_durations";
/// Key holding the completed work session counter.
pub const COMPLETED_SESSIONS_KEY: &str = "pomodoro_completed_sessions";
/// Key holding the cumulative focus minutes.
pub const TOTAL_FOCUS_MINUTES_KEY: &str = "pomodoro_total_focus_minutes";
/// Key holding the per-day study statistics.
pub const DAILY_STATS_KEY: &str = "daily_study_stats";

/// Every key the application writes.
pub const ALL_KEYS: [&str; 4] = [
    DURATIONS_KEY,
    COMPLETED_SESSIONS_KEY,
    TOTAL_FOCUS_MINUTES_KEY,
    DAILY_STATS_KEY,
];

/// String get/set/remove by key.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Store handle shared by every component that persists state.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Reads and parses `key`, returning `None` when the key is missing, the
/// read fails, or the value does not parse. Never fails.
pub fn read_parsed<T: FromStr>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Failed to read {}: {}", key, e);
            return None;
        }
    };
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!("Discarding malformed value for {}: {:?}", key, raw);
            None
        }
    }
}

/// Writes `value` under `key`, logging instead of failing.
pub fn write_logged(store: &dyn KeyValueStore, key: &str, value: &str) {
    if let Err(e) = store.set(key, value) {
        warn!("Failed to persist {}: {}", key, e);
    }
}

/// Removes every application key (sign-out / account deletion).
///
/// # Errors
///
/// Returns the first removal failure.
pub fn clear_all(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    for key in ALL_KEYS {
        store.remove(key)?;
    }
    Ok(())
}
