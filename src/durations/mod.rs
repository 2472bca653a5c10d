//! Duration configuration store.
//!
//! Holds the nominal duration of each timer mode. Values are validated on
//! load and on set, so the engine never sees an out-of-range duration:
//! malformed or out-of-range persisted data is discarded in favour of the
//! defaults, and out-of-range updates are rejected.

use thiserror::Error;
use tracing::{debug, warn};

use crate::storage::{write_logged, SharedStore, DURATIONS_KEY};
use crate::types::{DurationConfig, TimerMode, MAX_SECONDS, MIN_DURATION_SECONDS};

/// Errors returned when replacing the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    /// A duration is outside `[MIN_DURATION_SECONDS, MAX_SECONDS]`.
    #[error("{mode} duration must be between {min} and {max} seconds, got {seconds}")]
    OutOfRange {
        mode: TimerMode,
        seconds: u32,
        min: u32,
        max: u32,
    },
}

/// Validated, persisted per-mode durations.
pub struct DurationStore {
    store: SharedStore,
    config: DurationConfig,
}

impl DurationStore {
    /// Loads the configuration from `store`, falling back to defaults when
    /// the persisted value is missing, malformed, or out of range.
    pub fn load(store: SharedStore) -> Self {
        let config = load_config(&store);
        Self { store, config }
    }

    /// Returns the current configuration.
    pub fn get(&self) -> DurationConfig {
        self.config
    }

    /// Returns the duration of `mode` in seconds.
    pub fn duration(&self, mode: TimerMode) -> u32 {
        self.config.get(mode)
    }

    /// Replaces the whole configuration and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`DurationError::OutOfRange`] without changing anything if any
    /// entry is out of bounds.
    pub fn set(&mut self, config: DurationConfig) -> Result<(), DurationError> {
        config
            .validate()
            .map_err(|(mode, seconds)| DurationError::OutOfRange {
                mode,
                seconds,
                min: MIN_DURATION_SECONDS,
                max: MAX_SECONDS,
            })?;

        self.config = config;
        match serde_json::to_string(&config) {
            Ok(json) => write_logged(self.store.as_ref(), DURATIONS_KEY, &json),
            Err(e) => warn!("Failed to serialize durations: {}", e),
        }
        debug!(?config, "Durations updated");
        Ok(())
    }
}

impl std::fmt::Debug for DurationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurationStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn load_config(store: &SharedStore) -> DurationConfig {
    let raw = match store.get(DURATIONS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return DurationConfig::default(),
        Err(e) => {
            warn!("Failed to read durations, using defaults: {}", e);
            return DurationConfig::default();
        }
    };

    match serde_json::from_str::<DurationConfig>(&raw) {
        Ok(config) if config.is_valid() => config,
        Ok(config) => {
            debug!(?config, "Persisted durations out of range, using defaults");
            DurationConfig::default()
        }
        Err(e) => {
            debug!("Persisted durations malformed, using defaults: {}", e);
            DurationConfig::default()
        }
    }
}
