//! Dial interaction controller.
//!
//! Turns a circular drag gesture on a clock-face control into a countdown
//! value. While a drag is in progress the pointer sets the remaining time
//! live; on release the value becomes the configured duration of the active
//! mode. Gestures are ignored entirely while the timer is running.
//!
//! Angles are measured clockwise from 12 o'clock in screen coordinates
//! (y grows downward) and normalized to `[0°, 360°)`. Exactly 360° wraps to
//! 0°, so the seam maps to 0 seconds; angles just below the seam round up to
//! [`MAX_SECONDS`].

use tracing::{debug, warn};

use crate::durations::DurationError;
use crate::types::{
    clamp_duration, DialIndicator, DurationConfig, TimerMode, MAX_MINUTES, MAX_SECONDS,
};

// ============================================================================
// Geometry
// ============================================================================

/// A point in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Measured position and size of the dial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialGeometry {
    /// Center of the dial
    pub center: Point,
    /// Radius of the indicator track
    pub radius: f64,
}

impl DialGeometry {
    pub fn new(center: Point, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Geometry of a dial laid out in the given bounding box.
    pub fn from_bounds(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            center: Point::new(x + width / 2.0, y + height / 2.0),
            radius: width.min(height) / 2.0,
        }
    }

    /// False until the dial has been measured with a positive size.
    pub fn is_valid(&self) -> bool {
        self.center.is_finite() && self.radius.is_finite() && self.radius > 0.0
    }
}

// ============================================================================
// Mappings
// ============================================================================

/// Normalizes any angle into `[0, 360)`.
pub fn normalize_angle(degrees: f64) -> f64 {
    let angle = degrees.rem_euclid(360.0);
    // rem_euclid can round tiny negative inputs up to exactly 360.0
    if angle >= 360.0 {
        0.0
    } else {
        angle
    }
}

/// Angle of `pointer` around the dial center, clockwise from 12 o'clock.
///
/// Returns `None` for unmeasured geometry or a pointer exactly on the center.
pub fn angle_from_pointer(geometry: &DialGeometry, pointer: Point) -> Option<f64> {
    if !geometry.is_valid() || !pointer.is_finite() {
        return None;
    }
    let dx = pointer.x - geometry.center.x;
    let dy = pointer.y - geometry.center.y;
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    Some(normalize_angle(dy.atan2(dx).to_degrees() + 90.0))
}

/// Converts a dial angle to seconds: `round(angle / 360 × MAX_MINUTES × 60)`.
pub fn seconds_from_angle(angle_degrees: f64) -> u32 {
    let angle = normalize_angle(angle_degrees);
    let seconds = (angle / 360.0 * f64::from(MAX_MINUTES) * 60.0).round();
    (seconds as u32).min(MAX_SECONDS)
}

/// Converts remaining seconds to the indicator angle: `seconds / MAX_SECONDS × 360`.
pub fn angle_from_seconds(seconds: u32) -> f64 {
    f64::from(seconds.min(MAX_SECONDS)) / f64::from(MAX_SECONDS) * 360.0
}

/// Point on the dial track at `angle_degrees`.
pub fn point_at_angle(geometry: &DialGeometry, angle_degrees: f64) -> Point {
    let radians = angle_degrees.to_radians();
    Point::new(
        geometry.center.x + geometry.radius * radians.sin(),
        geometry.center.y - geometry.radius * radians.cos(),
    )
}

// ============================================================================
// DialTarget
// ============================================================================

/// What the dial needs from the timer: read access to the countdown, the
/// live setter, alarm dismissal, and the duration setter.
pub trait DialTarget {
    fn is_running(&self) -> bool;
    fn is_alarm_playing(&self) -> bool;
    fn mode(&self) -> TimerMode;
    fn time_left(&self) -> u32;
    fn set_time_left(&mut self, seconds: u32);
    fn stop_alarm(&mut self);
    fn durations(&self) -> DurationConfig;
    fn set_durations(&mut self, config: DurationConfig) -> Result<(), DurationError>;
}

// ============================================================================
// DialController
// ============================================================================

/// Drag gesture state for one dial.
#[derive(Debug, Clone, Default)]
pub struct DialController {
    geometry: Option<DialGeometry>,
    dragging: bool,
    drag_seconds: Option<u32>,
}

impl DialController {
    /// Creates a controller for an already measured dial.
    pub fn new(geometry: DialGeometry) -> Self {
        Self {
            geometry: Some(geometry),
            ..Self::default()
        }
    }

    /// Updates the measured geometry (layout changes, resizes).
    pub fn set_geometry(&mut self, geometry: DialGeometry) {
        self.geometry = Some(geometry);
    }

    /// Begins a drag. Returns false (and changes nothing) while running.
    pub fn on_gesture_start<T: DialTarget + ?Sized>(&mut self, target: &mut T) -> bool {
        if target.is_running() {
            debug!("Dial drag ignored while running");
            return false;
        }
        if target.is_alarm_playing() {
            target.stop_alarm();
        }
        self.dragging = true;
        self.drag_seconds = Some(target.time_left());
        true
    }

    /// Moves the drag to `pointer`, writing the new remaining time.
    ///
    /// Returns the seconds written, or `None` if the move was ignored
    /// (no drag, timer running, or unusable geometry for this frame).
    pub fn on_gesture_move<T: DialTarget + ?Sized>(
        &mut self,
        target: &mut T,
        pointer: Point,
    ) -> Option<u32> {
        if !self.dragging || target.is_running() {
            return None;
        }
        let geometry = self.geometry?;
        let angle = angle_from_pointer(&geometry, pointer)?;
        let seconds = seconds_from_angle(angle);

        target.set_time_left(seconds);
        self.drag_seconds = Some(seconds);
        Some(seconds)
    }

    /// Ends the drag and commits the remaining time as the active mode's
    /// duration, clamped into the legal range.
    ///
    /// Returns the committed configuration, or `None` if nothing was
    /// committed.
    pub fn on_gesture_end<T: DialTarget + ?Sized>(&mut self, target: &mut T) -> Option<DurationConfig> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;
        self.drag_seconds = None;

        if target.is_running() {
            return None;
        }

        let seconds = clamp_duration(target.time_left());
        let config = target.durations().with(target.mode(), seconds);
        match target.set_durations(config) {
            Ok(()) => Some(config),
            Err(e) => {
                warn!("Failed to commit dial duration: {}", e);
                None
            }
        }
    }

    /// Current indicator position.
    ///
    /// During a drag the pointer drives the angle directly and no animation
    /// applies; otherwise the angle tracks `time_left_seconds` and animates.
    pub fn indicator(&self, time_left_seconds: u32) -> DialIndicator {
        match (self.dragging, self.drag_seconds) {
            (true, Some(seconds)) => DialIndicator {
                angle_degrees: angle_from_seconds(seconds),
                dragging: true,
                animated: false,
            },
            _ => DialIndicator {
                angle_degrees: angle_from_seconds(time_left_seconds),
                dragging: self.dragging,
                animated: !self.dragging,
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn unit_dial() -> DialGeometry {
        DialGeometry::new(Point::new(100.0, 100.0), 50.0)
    }

    /// In-memory stand-in for the timer engine.
    #[derive(Debug)]
    struct FakeTimer {
        running: bool,
        alarm: bool,
        mode: TimerMode,
        time_left: u32,
        durations: DurationConfig,
        committed: Vec<DurationConfig>,
    }

    impl Default for FakeTimer {
        fn default() -> Self {
            Self {
                running: false,
                alarm: false,
                mode: TimerMode::Work,
                time_left: 1500,
                durations: DurationConfig::default(),
                committed: Vec::new(),
            }
        }
    }

    impl DialTarget for FakeTimer {
        fn is_running(&self) -> bool {
            self.running
        }
        fn is_alarm_playing(&self) -> bool {
            self.alarm
        }
        fn mode(&self) -> TimerMode {
            self.mode
        }
        fn time_left(&self) -> u32 {
            self.time_left
        }
        fn set_time_left(&mut self, seconds: u32) {
            self.time_left = seconds;
        }
        fn stop_alarm(&mut self) {
            self.alarm = false;
        }
        fn durations(&self) -> DurationConfig {
            self.durations
        }
        fn set_durations(&mut self, config: DurationConfig) -> Result<(), DurationError> {
            self.durations = config;
            self.committed.push(config);
            Ok(())
        }
    }

    mod mapping_tests {
        use super::*;

        #[test]
        fn test_angle_cardinal_directions() {
            let dial = unit_dial();
            let top = angle_from_pointer(&dial, Point::new(100.0, 0.0)).unwrap();
            let right = angle_from_pointer(&dial, Point::new(200.0, 100.0)).unwrap();
            let bottom = angle_from_pointer(&dial, Point::new(100.0, 180.0)).unwrap();
            let left = angle_from_pointer(&dial, Point::new(10.0, 100.0)).unwrap();

            assert!(top.abs() < EPSILON);
            assert!((right - 90.0).abs() < EPSILON);
            assert!((bottom - 180.0).abs() < EPSILON);
            assert!((left - 270.0).abs() < EPSILON);
        }

        #[test]
        fn test_angle_rejects_unmeasured_dial() {
            let dial = DialGeometry::new(Point::new(0.0, 0.0), 0.0);
            assert_eq!(angle_from_pointer(&dial, Point::new(10.0, 10.0)), None);

            let dial = DialGeometry::new(Point::new(f64::NAN, 0.0), 10.0);
            assert_eq!(angle_from_pointer(&dial, Point::new(10.0, 10.0)), None);
        }

        #[test]
        fn test_angle_rejects_pointer_on_center() {
            assert_eq!(angle_from_pointer(&unit_dial(), Point::new(100.0, 100.0)), None);
        }

        #[test]
        fn test_normalize_angle() {
            assert_eq!(normalize_angle(360.0), 0.0);
            assert_eq!(normalize_angle(-90.0), 270.0);
            assert_eq!(normalize_angle(450.0), 90.0);
            assert!(normalize_angle(-1e-20) < 360.0);
        }

        #[test]
        fn test_seconds_from_angle() {
            assert_eq!(seconds_from_angle(0.0), 0);
            assert_eq!(seconds_from_angle(90.0), 900);
            assert_eq!(seconds_from_angle(180.0), 1800);
            assert_eq!(seconds_from_angle(360.0), 0);
            assert_eq!(seconds_from_angle(359.99), 3600);
            assert_eq!(seconds_from_angle(60.0), 600);
        }

        #[test]
        fn test_angle_from_seconds() {
            assert!((angle_from_seconds(1800) - 180.0).abs() < EPSILON);
            assert!((angle_from_seconds(3600) - 360.0).abs() < EPSILON);
            assert!((angle_from_seconds(99_999) - 360.0).abs() < EPSILON);
        }

        #[test]
        fn test_track_point_follows_remaining_time() {
            let dial = unit_dial();
            let quarter = point_at_angle(&dial, angle_from_seconds(900));
            assert!((quarter.x - 150.0).abs() < EPSILON);
            assert!((quarter.y - 100.0).abs() < EPSILON);

            let zero = point_at_angle(&dial, angle_from_seconds(0));
            assert!((zero.x - 100.0).abs() < EPSILON);
            assert!((zero.y - 50.0).abs() < EPSILON);
        }

        #[test]
        fn test_point_at_angle_round_trips_through_pointer_angle() {
            let dial = unit_dial();
            let pointer = point_at_angle(&dial, 225.0);
            let angle = angle_from_pointer(&dial, pointer).unwrap();
            assert!((angle - 225.0).abs() < 1e-6);
        }

        #[test]
        fn test_from_bounds() {
            let dial = DialGeometry::from_bounds(10.0, 20.0, 200.0, 100.0);
            assert_eq!(dial.center, Point::new(110.0, 70.0));
            assert_eq!(dial.radius, 50.0);
            assert!(dial.is_valid());
        }
    }

    mod gesture_tests {
        use super::*;

        #[test]
        fn test_half_turn_sets_thirty_minutes_and_commits() {
            let dial = unit_dial();
            let mut timer = FakeTimer::default();
            let mut controller = DialController::new(dial);

            assert!(controller.on_gesture_start(&mut timer));
            let seconds = controller.on_gesture_move(&mut timer, Point::new(100.0, 150.0));
            assert_eq!(seconds, Some(1800));
            assert_eq!(timer.time_left, 1800);

            let committed = controller.on_gesture_end(&mut timer).unwrap();
            assert_eq!(committed.work, 1800);
            assert_eq!(committed.short, 300);
            assert_eq!(committed.long, 900);
            assert_eq!(timer.durations.work, 1800);
            assert!(!controller.dragging);
        }

        #[test]
        fn test_commit_applies_to_active_mode_only() {
            let mut timer = FakeTimer {
                mode: TimerMode::LongBreak,
                time_left: 900,
                ..FakeTimer::default()
            };
            let mut controller = DialController::new(unit_dial());

            controller.on_gesture_start(&mut timer);
            controller.on_gesture_move(&mut timer, Point::new(150.0, 100.0));
            controller.on_gesture_end(&mut timer);

            assert_eq!(timer.durations.long, 900);
            assert_eq!(timer.durations.work, 1500);
            assert_eq!(timer.durations.short, 300);
            assert_eq!(timer.committed.len(), 1);
        }

        #[test]
        fn test_gestures_ignored_while_running() {
            let mut timer = FakeTimer {
                running: true,
                time_left: 1200,
                ..FakeTimer::default()
            };
            let mut controller = DialController::new(unit_dial());

            assert!(!controller.on_gesture_start(&mut timer));
            assert_eq!(controller.on_gesture_move(&mut timer, Point::new(100.0, 150.0)), None);
            assert_eq!(controller.on_gesture_end(&mut timer), None);
            assert_eq!(timer.time_left, 1200);
            assert!(timer.committed.is_empty());
        }

        #[test]
        fn test_move_ignored_after_timer_starts_mid_drag() {
            let mut timer = FakeTimer::default();
            let mut controller = DialController::new(unit_dial());

            controller.on_gesture_start(&mut timer);
            timer.running = true;

            assert_eq!(controller.on_gesture_move(&mut timer, Point::new(100.0, 150.0)), None);
            assert_eq!(timer.time_left, 1500);
            assert_eq!(controller.on_gesture_end(&mut timer), None);
            assert!(timer.committed.is_empty());
        }

        #[test]
        fn test_start_stops_alarm() {
            let mut timer = FakeTimer {
                alarm: true,
                ..FakeTimer::default()
            };
            let mut controller = DialController::new(unit_dial());

            controller.on_gesture_start(&mut timer);
            assert!(!timer.alarm);
        }

        #[test]
        fn test_move_without_start_is_ignored() {
            let mut timer = FakeTimer::default();
            let mut controller = DialController::new(unit_dial());

            assert_eq!(controller.on_gesture_move(&mut timer, Point::new(100.0, 150.0)), None);
            assert_eq!(controller.on_gesture_end(&mut timer), None);
            assert_eq!(timer.time_left, 1500);
        }

        #[test]
        fn test_unmeasured_dial_skips_frame() {
            let mut timer = FakeTimer::default();
            let mut controller = DialController::default();

            controller.on_gesture_start(&mut timer);
            assert_eq!(controller.on_gesture_move(&mut timer, Point::new(100.0, 150.0)), None);
            assert_eq!(timer.time_left, 1500);

            controller.set_geometry(unit_dial());
            assert_eq!(
                controller.on_gesture_move(&mut timer, Point::new(100.0, 150.0)),
                Some(1800)
            );
        }

        #[test]
        fn test_commit_clamps_short_drag_to_minimum() {
            let mut timer = FakeTimer::default();
            let mut controller = DialController::new(unit_dial());

            controller.on_gesture_start(&mut timer);
            // a few degrees past 12 o'clock
            let pointer = point_at_angle(&unit_dial(), 3.0);
            assert_eq!(controller.on_gesture_move(&mut timer, pointer), Some(30));

            let committed = controller.on_gesture_end(&mut timer).unwrap();
            assert_eq!(committed.work, 60);
            assert_eq!(timer.time_left, 30);
        }
    }

    mod indicator_tests {
        use super::*;

        #[test]
        fn test_indicator_tracks_time_when_idle() {
            let controller = DialController::new(unit_dial());
            let indicator = controller.indicator(900);
            assert!((indicator.angle_degrees - 90.0).abs() < EPSILON);
            assert!(indicator.animated);
            assert!(!indicator.dragging);
        }

        #[test]
        fn test_indicator_follows_pointer_without_animation_while_dragging() {
            let mut timer = FakeTimer::default();
            let mut controller = DialController::new(unit_dial());

            controller.on_gesture_start(&mut timer);
            controller.on_gesture_move(&mut timer, Point::new(100.0, 150.0));

            let indicator = controller.indicator(timer.time_left);
            assert!((indicator.angle_degrees - 180.0).abs() < EPSILON);
            assert!(indicator.dragging);
            assert!(!indicator.animated);

            controller.on_gesture_end(&mut timer);
            assert!(controller.indicator(timer.time_left).animated);
        }
    }
}
