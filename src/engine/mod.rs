//! Timer engine module.
//!
//! - `timer`: countdown state machine with completion transitions
//! - `event`: discrete events published to observers
//! - `service`: single-task driver owning the tick loop and alarm window

pub mod event;
pub mod service;
pub mod timer;

pub use event::TimerEvent;
pub use service::{TimerHandle, TimerService, TICK_PERIOD};
pub use timer::{persisted_counters, TickOutcome, TimerEngine, ALARM_WINDOW};
