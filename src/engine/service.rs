//! Timer service: the single task that owns the engine.
//!
//! All reads and writes of the timer state happen on one tokio task, which
//! multiplexes three sources with `select!`:
//!
//! ```text
//!  TimerHandle ──commands──▶ ┌────────────────┐ ──watch──▶ TimerSnapshot observers
//!  1s interval ─────tick───▶ │ TimerEngine    │
//!  alarm timer ───expire───▶ │ DialController │ ──mpsc───▶ TimerEvent observers
//!                            └────────────────┘
//! ```
//!
//! There is at most one tick interval. It is dropped and recreated whenever
//! a command changes `is_running` or `time_left_seconds`, and dropped when
//! the service shuts down, so two loops can never decrement the same
//! countdown. Missed ticks (e.g. a suspended process) are skipped rather than
//! caught up: the countdown simply resumes from where it was.

use anyhow::{anyhow, Context, Result};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Duration, Instant, Interval, MissedTickBehavior};
use tracing::debug;

use crate::dial::{DialController, DialGeometry, Point};
use crate::durations::DurationError;
use crate::types::{DurationConfig, TimerMode, TimerSnapshot};

use super::timer::{TickOutcome, TimerEngine};

/// Countdown cadence.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug)]
enum Command {
    ToggleRunning,
    Reset,
    SwitchMode { mode: TimerMode, announce: bool },
    SetTimeLeft(u32),
    StopAlarm,
    SetDurations(DurationConfig),
    SetDialGeometry(DialGeometry),
    DialStart,
    DialMove(Point),
    DialEnd,
    Snapshot,
    Shutdown,
}

struct Request {
    command: Command,
    reply: oneshot::Sender<Result<TimerSnapshot, DurationError>>,
}

// ============================================================================
// TimerService
// ============================================================================

/// Spawns the task that drives a [`TimerEngine`].
pub struct TimerService;

impl TimerService {
    /// Moves `engine` and `dial` onto a new task.
    ///
    /// The task ends when [`TimerHandle::shutdown`] is called or every
    /// handle has been dropped; either way the tick loop is cancelled and
    /// any sounding alarm is stopped.
    pub fn spawn(engine: TimerEngine, dial: DialController) -> (TimerHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(snapshot_of(&engine, &dial));
        let task = TimerTask {
            engine,
            dial,
            rx,
            snapshot_tx,
        };

        let join = tokio::spawn(task.run());
        (TimerHandle { tx, snapshot_rx }, join)
    }
}

fn snapshot_of(engine: &TimerEngine, dial: &DialController) -> TimerSnapshot {
    let timer = engine.state().clone();
    TimerSnapshot {
        dial: dial.indicator(timer.time_left_seconds),
        durations: engine.durations(),
        timer,
    }
}

struct TimerTask {
    engine: TimerEngine,
    dial: DialController,
    rx: mpsc::UnboundedReceiver<Request>,
    snapshot_tx: watch::Sender<TimerSnapshot>,
}

impl TimerTask {
    async fn run(mut self) {
        let mut ticker: Option<Interval> = None;

        loop {
            let alarm_deadline = self.engine.alarm_deadline();

            tokio::select! {
                request = self.rx.recv() => {
                    let Some(Request { command, reply }) = request else {
                        debug!("All timer handles dropped");
                        break;
                    };
                    if matches!(command, Command::Shutdown) {
                        let _ = reply.send(Ok(self.snapshot()));
                        break;
                    }

                    let before = self.tick_key();
                    let result = self.apply(command);
                    if self.tick_key() != before {
                        ticker = None;
                    }
                    self.sync_ticker(&mut ticker);
                    self.publish();
                    let _ = reply.send(result.map(|()| self.snapshot()));
                }
                _ = next_tick(&mut ticker) => {
                    if self.engine.tick() == TickOutcome::Completed {
                        ticker = None;
                    }
                    self.sync_ticker(&mut ticker);
                    self.publish();
                }
                _ = alarm_expiry(alarm_deadline) => {
                    self.engine.expire_alarm(Instant::now());
                    self.publish();
                }
            }
        }

        drop(ticker);
        self.engine.stop_alarm();
        self.publish();
        debug!("Timer service stopped");
    }

    fn apply(&mut self, command: Command) -> Result<(), DurationError> {
        match command {
            Command::ToggleRunning => self.engine.toggle_running(),
            Command::Reset => self.engine.reset(),
            Command::SwitchMode { mode, announce } => self.engine.switch_mode(mode, announce),
            Command::SetTimeLeft(seconds) => self.engine.set_time_left(seconds),
            Command::StopAlarm => self.engine.stop_alarm(),
            Command::SetDurations(config) => self.engine.set_durations(config)?,
            Command::SetDialGeometry(geometry) => self.dial.set_geometry(geometry),
            Command::DialStart => {
                self.dial.on_gesture_start(&mut self.engine);
            }
            Command::DialMove(pointer) => {
                self.dial.on_gesture_move(&mut self.engine, pointer);
            }
            Command::DialEnd => {
                self.dial.on_gesture_end(&mut self.engine);
            }
            Command::Snapshot | Command::Shutdown => {}
        }
        Ok(())
    }

    fn tick_key(&self) -> (bool, u32) {
        let state = self.engine.state();
        (state.is_running, state.time_left_seconds)
    }

    /// Ensures exactly one interval exists while counting down, none otherwise.
    fn sync_ticker(&self, ticker: &mut Option<Interval>) {
        if !self.engine.state().is_counting_down() {
            *ticker = None;
        } else if ticker.is_none() {
            *ticker = Some(new_ticker());
        }
    }

    fn snapshot(&self) -> TimerSnapshot {
        snapshot_of(&self.engine, &self.dial)
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

fn new_ticker() -> Interval {
    // first tick one full period after (re)start
    let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn alarm_expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

// ============================================================================
// TimerHandle
// ============================================================================

/// Cloneable handle to a running [`TimerService`].
///
/// Every operation is applied in order on the service task and returns the
/// snapshot right after it took effect.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    tx: mpsc::UnboundedSender<Request>,
    snapshot_rx: watch::Receiver<TimerSnapshot>,
}

impl TimerHandle {
    async fn request(&self, command: Command) -> Result<TimerSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Request {
                command,
                reply: reply_tx,
            })
            .map_err(|_| anyhow!("timer service is not running"))?;

        let reply = reply_rx
            .await
            .context("timer service stopped before replying")?;
        Ok(reply?)
    }

    /// Starts or stops the countdown.
    pub async fn toggle_running(&self) -> Result<TimerSnapshot> {
        self.request(Command::ToggleRunning).await
    }

    /// Stops and restores the current mode's duration.
    pub async fn reset(&self) -> Result<TimerSnapshot> {
        self.request(Command::Reset).await
    }

    /// Stops and switches to `mode`, optionally announcing it.
    pub async fn switch_mode(&self, mode: TimerMode, announce: bool) -> Result<TimerSnapshot> {
        self.request(Command::SwitchMode { mode, announce }).await
    }

    /// Overwrites the remaining time (clamped).
    pub async fn set_time_left(&self, seconds: u32) -> Result<TimerSnapshot> {
        self.request(Command::SetTimeLeft(seconds)).await
    }

    /// Dismisses the alarm.
    pub async fn stop_alarm(&self) -> Result<TimerSnapshot> {
        self.request(Command::StopAlarm).await
    }

    /// Replaces the configured durations.
    ///
    /// # Errors
    ///
    /// Fails with a [`DurationError`] (reachable via `downcast_ref`) if the
    /// configuration is out of range, or if the service has stopped.
    pub async fn set_durations(&self, config: DurationConfig) -> Result<TimerSnapshot> {
        self.request(Command::SetDurations(config)).await
    }

    /// Updates the measured dial geometry.
    pub async fn set_dial_geometry(&self, geometry: DialGeometry) -> Result<TimerSnapshot> {
        self.request(Command::SetDialGeometry(geometry)).await
    }

    /// Pointer pressed on the dial.
    pub async fn dial_start(&self) -> Result<TimerSnapshot> {
        self.request(Command::DialStart).await
    }

    /// Pointer dragged to `pointer`.
    pub async fn dial_move(&self, pointer: Point) -> Result<TimerSnapshot> {
        self.request(Command::DialMove(pointer)).await
    }

    /// Pointer released.
    pub async fn dial_end(&self) -> Result<TimerSnapshot> {
        self.request(Command::DialEnd).await
    }

    /// Fetches the current snapshot through the service.
    pub async fn snapshot(&self) -> Result<TimerSnapshot> {
        self.request(Command::Snapshot).await
    }

    /// Last published snapshot, without a round trip.
    pub fn current(&self) -> TimerSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Cancels the tick loop, stops the alarm, and ends the service task.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(Command::Shutdown).await.map(|_| ())
    }

    /// Returns true while the service task is alive.
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dial::point_at_angle;
    use crate::engine::TimerEvent;
    use crate::sound::MockAlarmPlayer;
    use crate::stats::MockStudyStats;
    use crate::storage::MemoryStore;

    struct Harness {
        handle: TimerHandle,
        join: JoinHandle<()>,
        events: mpsc::UnboundedReceiver<TimerEvent>,
        stats: Arc<MockStudyStats>,
        alarm: Arc<MockAlarmPlayer>,
    }

    fn dial() -> DialGeometry {
        DialGeometry::new(Point::new(0.0, 0.0), 100.0)
    }

    fn spawn() -> Harness {
        let stats = Arc::new(MockStudyStats::new());
        let alarm = Arc::new(MockAlarmPlayer::new());
        let (tx, events) = mpsc::unbounded_channel();
        let engine = TimerEngine::new(
            Arc::new(MemoryStore::new()),
            stats.clone(),
            alarm.clone(),
            tx,
        );
        let (handle, join) = TimerService::spawn(engine, DialController::new(dial()));
        Harness {
            handle,
            join,
            events,
            stats,
            alarm,
        }
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    mod tick_loop_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_counts_down_once_per_second() {
            let h = spawn();
            h.handle.toggle_running().await.unwrap();

            tokio::time::sleep(ms(3_500)).await;

            let snapshot = h.handle.snapshot().await.unwrap();
            assert_eq!(snapshot.timer.time_left_seconds, 1497);
            assert!(snapshot.timer.is_running);
        }

        #[tokio::test(start_paused = true)]
        async fn test_repeated_commands_do_not_stack_loops() {
            let h = spawn();
            h.handle.toggle_running().await.unwrap();

            for _ in 0..5 {
                h.handle.stop_alarm().await.unwrap();
                h.handle.snapshot().await.unwrap();
            }
            tokio::time::sleep(ms(2_500)).await;
            for _ in 0..5 {
                h.handle.stop_alarm().await.unwrap();
            }
            tokio::time::sleep(ms(1_000)).await;

            let snapshot = h.handle.snapshot().await.unwrap();
            assert_eq!(snapshot.timer.time_left_seconds, 1497);
        }

        #[tokio::test(start_paused = true)]
        async fn test_stop_cancels_loop() {
            let h = spawn();
            h.handle.toggle_running().await.unwrap();
            tokio::time::sleep(ms(2_500)).await;
            h.handle.toggle_running().await.unwrap();

            tokio::time::sleep(ms(5_000)).await;

            let snapshot = h.handle.snapshot().await.unwrap();
            assert_eq!(snapshot.timer.time_left_seconds, 1498);
            assert!(!snapshot.timer.is_running);
        }

        #[tokio::test(start_paused = true)]
        async fn test_zeroing_time_while_running_completes() {
            let h = spawn();
            h.handle.toggle_running().await.unwrap();
            tokio::time::sleep(ms(1_500)).await;

            let snapshot = h.handle.set_time_left(0).await.unwrap();
            assert_eq!(snapshot.timer.mode, TimerMode::ShortBreak);
            assert_eq!(snapshot.timer.completed_sessions, 1);
            assert!(!snapshot.timer.is_running);
            assert_eq!(snapshot.timer.time_left_seconds, 300);

            tokio::time::sleep(ms(10_000)).await;
            let snapshot = h.handle.snapshot().await.unwrap();
            assert_eq!(snapshot.timer.completed_sessions, 1);
            assert_eq!(snapshot.timer.time_left_seconds, 300);
            assert_eq!(h.stats.calls().len(), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn test_reset_cancels_loop() {
            let h = spawn();
            h.handle.toggle_running().await.unwrap();
            tokio::time::sleep(ms(2_500)).await;

            let snapshot = h.handle.reset().await.unwrap();
            assert_eq!(snapshot.timer.time_left_seconds, 1500);

            tokio::time::sleep(ms(3_000)).await;
            assert_eq!(h.handle.snapshot().await.unwrap().timer.time_left_seconds, 1500);
        }

        #[tokio::test(start_paused = true)]
        async fn test_subscribers_see_ticks() {
            let h = spawn();
            let mut rx = h.handle.subscribe();
            h.handle.toggle_running().await.unwrap();
            rx.borrow_and_update();

            rx.changed().await.unwrap();
            assert_eq!(rx.borrow_and_update().timer.time_left_seconds, 1499);
        }
    }

    mod completion_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_completion_and_alarm_window() {
            let mut h = spawn();
            h.handle.set_time_left(2).await.unwrap();
            h.handle.toggle_running().await.unwrap();

            tokio::time::sleep(ms(2_500)).await;
            let snapshot = h.handle.snapshot().await.unwrap();
            assert_eq!(snapshot.timer.mode, TimerMode::ShortBreak);
            assert_eq!(snapshot.timer.time_left_seconds, 300);
            assert_eq!(snapshot.timer.completed_sessions, 1);
            assert!(!snapshot.timer.is_running);
            assert!(snapshot.timer.is_alarm_playing);
            assert_eq!(h.alarm.play_count(), 1);

            tokio::time::sleep(ms(3_000)).await;
            let snapshot = h.handle.snapshot().await.unwrap();
            assert!(!snapshot.timer.is_alarm_playing);
            assert!(!h.alarm.is_playing());

            let mut saw_alarm_stopped = false;
            while let Ok(event) = h.events.try_recv() {
                saw_alarm_stopped |= event == TimerEvent::AlarmStopped;
            }
            assert!(saw_alarm_stopped);
            assert_eq!(h.stats.focus_sessions(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_stop_alarm_dismisses_early() {
            let h = spawn();
            h.handle.set_time_left(1).await.unwrap();
            h.handle.toggle_running().await.unwrap();
            tokio::time::sleep(ms(1_500)).await;

            assert!(h.handle.snapshot().await.unwrap().timer.is_alarm_playing);
            let snapshot = h.handle.stop_alarm().await.unwrap();
            assert!(!snapshot.timer.is_alarm_playing);
        }
    }

    mod dial_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_drag_sets_and_commits_duration() {
            let h = spawn();
            h.handle.dial_start().await.unwrap();
            let snapshot = h
                .handle
                .dial_move(point_at_angle(&dial(), 180.0))
                .await
                .unwrap();
            assert_eq!(snapshot.timer.time_left_seconds, 1800);
            assert!(snapshot.dial.dragging);
            assert!(!snapshot.dial.animated);

            let snapshot = h.handle.dial_end().await.unwrap();
            assert_eq!(snapshot.durations.work, 1800);
            assert!(!snapshot.dial.dragging);
            assert!(snapshot.dial.animated);
        }

        #[tokio::test(start_paused = true)]
        async fn test_drag_ignored_while_running() {
            let h = spawn();
            h.handle.toggle_running().await.unwrap();

            h.handle.dial_start().await.unwrap();
            let snapshot = h
                .handle
                .dial_move(point_at_angle(&dial(), 90.0))
                .await
                .unwrap();
            assert_eq!(snapshot.timer.time_left_seconds, 1500);

            let snapshot = h.handle.dial_end().await.unwrap();
            assert_eq!(snapshot.durations.work, 1500);
        }
    }

    mod lifecycle_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_shutdown_ends_task_and_stops_alarm() {
            let h = spawn();
            h.handle.set_time_left(1).await.unwrap();
            h.handle.toggle_running().await.unwrap();
            tokio::time::sleep(ms(1_500)).await;
            assert!(h.alarm.is_playing());

            h.handle.shutdown().await.unwrap();
            h.join.await.unwrap();

            assert!(!h.alarm.is_playing());
            assert!(!h.handle.is_running());
            assert!(h.handle.toggle_running().await.is_err());
        }

        #[tokio::test(start_paused = true)]
        async fn test_dropping_handles_ends_task() {
            let h = spawn();
            let Harness { handle, join, .. } = h;
            drop(handle);
            join.await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_invalid_durations_are_rejected() {
            let h = spawn();
            let err = h
                .handle
                .set_durations(DurationConfig {
                    work: 30,
                    short: 300,
                    long: 900,
                })
                .await
                .unwrap_err();
            assert!(err.downcast_ref::<DurationError>().is_some());
            assert_eq!(h.handle.current().durations, DurationConfig::default());
        }
    }
}
