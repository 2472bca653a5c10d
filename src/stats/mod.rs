//! Daily study statistics.
//!
//! The timer reports each completed work session here: the session length
//! in whole minutes and one focus session. Records are kept per local
//! calendar day under a single storage key.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::{write_logged, SharedStore, DAILY_STATS_KEY};

/// Receives study-time reports from the timer engine.
pub trait StudyStats: Send + Sync {
    /// Adds `minutes` of study time to today's record.
    fn add_study_time(&self, minutes: u32);

    /// Counts one completed focus session for today.
    fn increment_focus_session(&self);
}

/// Statistics for a single day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    /// Minutes studied
    #[serde(default)]
    pub study_minutes: u32,
    /// Completed focus sessions
    #[serde(default)]
    pub focus_sessions: u32,
}

/// Persists [`DailyStats`] keyed by local date.
pub struct DailyStatsRecorder {
    store: SharedStore,
    today: Box<dyn Fn() -> NaiveDate + Send + Sync>,
    lock: Mutex<()>,
}

impl DailyStatsRecorder {
    /// Creates a recorder that dates records with the local clock.
    pub fn new(store: SharedStore) -> Self {
        Self::with_clock(store, || Local::now().date_naive())
    }

    /// Creates a recorder with a custom date source.
    pub fn with_clock<F>(store: SharedStore, today: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        Self {
            store,
            today: Box::new(today),
            lock: Mutex::new(()),
        }
    }

    /// Returns today's record.
    pub fn today(&self) -> DailyStats {
        self.all().get(&(self.today)()).copied().unwrap_or_default()
    }

    /// Returns every recorded day.
    pub fn all(&self) -> BTreeMap<NaiveDate, DailyStats> {
        let raw = match self.store.get(DAILY_STATS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return BTreeMap::new(),
            Err(e) => {
                warn!("Failed to read daily stats: {}", e);
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            debug!("Discarding malformed daily stats: {}", e);
            BTreeMap::new()
        })
    }

    fn update(&self, apply: impl FnOnce(&mut DailyStats)) {
        // Serializes read-modify-write cycles on the shared key.
        let _guard = match self.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut days = self.all();
        apply(days.entry((self.today)()).or_default());

        match serde_json::to_string(&days) {
            Ok(json) => write_logged(self.store.as_ref(), DAILY_STATS_KEY, &json),
            Err(e) => warn!("Failed to serialize daily stats: {}", e),
        }
    }
}

impl StudyStats for DailyStatsRecorder {
    fn add_study_time(&self, minutes: u32) {
        self.update(|day| day.study_minutes = day.study_minutes.saturating_add(minutes));
    }

    fn increment_focus_session(&self) {
        self.update(|day| day.focus_sessions = day.focus_sessions.saturating_add(1));
    }
}

impl std::fmt::Debug for DailyStatsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyStatsRecorder").finish_non_exhaustive()
    }
}

/// A call received by [`MockStudyStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsCall {
    AddStudyTime(u32),
    IncrementFocusSession,
}

/// Mock statistics collaborator for testing.
#[derive(Debug, Default)]
pub struct MockStudyStats {
    calls: Mutex<Vec<StatsCall>>,
}

impl MockStudyStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: StatsCall) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<StatsCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Sum of all reported study minutes.
    #[must_use]
    pub fn total_minutes(&self) -> u32 {
        self.calls()
            .iter()
            .map(|call| match call {
                StatsCall::AddStudyTime(minutes) => *minutes,
                StatsCall::IncrementFocusSession => 0,
            })
            .sum()
    }

    /// Number of reported focus sessions.
    #[must_use]
    pub fn focus_sessions(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, StatsCall::IncrementFocusSession))
            .count()
    }
}

impl StudyStats for MockStudyStats {
    fn add_study_time(&self, minutes: u32) {
        self.record(StatsCall::AddStudyTime(minutes));
    }

    fn increment_focus_session(&self) {
        self.record(StatsCall::IncrementFocusSession);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};

    fn fixed_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
    }

    mod recorder_tests {
        use super::*;

        #[test]
        fn test_empty_store_has_zero_stats() {
            let recorder = DailyStatsRecorder::with_clock(Arc::new(MemoryStore::new()), fixed_date);
            assert_eq!(recorder.today(), DailyStats::default());
            assert!(recorder.all().is_empty());
        }

        #[test]
        fn test_records_accumulate_for_today() {
            let store = Arc::new(MemoryStore::new());
            let recorder = DailyStatsRecorder::with_clock(store.clone(), fixed_date);

            recorder.add_study_time(25);
            recorder.increment_focus_session();
            recorder.add_study_time(10);
            recorder.increment_focus_session();

            assert_eq!(
                recorder.today(),
                DailyStats {
                    study_minutes: 35,
                    focus_sessions: 2
                }
            );
            assert!(store.get(DAILY_STATS_KEY).unwrap().unwrap().contains("2024-03-14"));
        }

        #[test]
        fn test_days_are_kept_separately() {
            let store = Arc::new(MemoryStore::new());
            let yesterday = DailyStatsRecorder::with_clock(store.clone(), || {
                NaiveDate::from_ymd_opt(2024, 3, 13).unwrap()
            });
            yesterday.add_study_time(50);

            let today = DailyStatsRecorder::with_clock(store, fixed_date);
            today.add_study_time(5);

            assert_eq!(today.today().study_minutes, 5);
            assert_eq!(today.all().len(), 2);
        }

        #[test]
        fn test_malformed_stats_are_discarded() {
            let store = Arc::new(MemoryStore::with_entries([(DAILY_STATS_KEY, "[oops")]));
            let recorder = DailyStatsRecorder::with_clock(store, fixed_date);

            assert_eq!(recorder.today(), DailyStats::default());
            recorder.increment_focus_session();
            assert_eq!(recorder.today().focus_sessions, 1);
        }
    }

    mod mock_tests {
        use super::*;

        #[test]
        fn test_mock_records_calls_in_order() {
            let mock = MockStudyStats::new();
            mock.add_study_time(10);
            mock.increment_focus_session();

            assert_eq!(
                mock.calls(),
                vec![StatsCall::AddStudyTime(10), StatsCall::IncrementFocusSession]
            );
            assert_eq!(mock.total_minutes(), 10);
            assert_eq!(mock.focus_sessions(), 1);
        }
    }
}
