//! Raw multi-pointer input to semantic gestures.
//!
//! The interpreter tracks at most two pointers: the *primary* (first down)
//! drives position, taps and flings; the *secondary* (second down) only
//! contributes the rotation angle. Further pointers are ignored.
//!
//! | Input | Emits |
//! |---|---|
//! | `Down` | `Down` |
//! | `PointerDown` (second pointer) | nothing; records the initial two-pointer angle |
//! | `Move` | `Move`, plus `MultiRotate` while two pointers are down |
//! | `PointerUp` (secondary) | `RotateEnd` |
//! | `PointerUp` (primary) | `RotateEnd`; the secondary becomes primary |
//! | `Up` | exactly one of `Fling`, `Tap`, `Up` |
//! | `Cancel` | nothing; tracking is reset |
//!
//! On `Up`, a fling wins over a tap, which wins over a plain up.

use kurbo::{Point, Vec2};
use std::collections::VecDeque;
use std::time::Duration;

pub type PointerId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Down,
    PointerDown,
    Move,
    PointerUp,
    Up,
    Cancel,
}

/// One raw input event.
///
/// `pointer` is the pointer the action refers to; `pointers` holds the
/// position of every pointer currently down, including one being lifted.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub time: Duration,
    pub action: PointerAction,
    pub pointer: PointerId,
    pub pointers: Vec<(PointerId, Point)>,
}

impl PointerEvent {
    /// Single-pointer event for pointer 0.
    pub fn single(time: Duration, action: PointerAction, pos: Point) -> Self {
        Self {
            time,
            action,
            pointer: 0,
            pointers: vec![(0, pos)],
        }
    }

    fn position(&self, pointer: PointerId) -> Option<Point> {
        self.pointers
            .iter()
            .find(|(id, _)| *id == pointer)
            .map(|(_, p)| *p)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    Down { pos: Point },
    /// Primary pointer motion; `delta` is relative to the previous event.
    Move { pos: Point, delta: Vec2 },
    /// Two-pointer angle relative to where the second pointer went down.
    MultiRotate { degrees: f64 },
    RotateEnd,
    /// Velocity in pixels per second.
    Fling { pos: Point, velocity: Vec2 },
    Tap { pos: Point },
    Up { pos: Point },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureThresholds {
    pub tap_timeout: Duration,
    /// Pixels a tap may travel.
    pub touch_slop: f64,
    /// Pixels per second a release must exceed to count as a fling.
    pub min_fling_velocity: f64,
    /// How far back release velocity is measured.
    pub velocity_window: Duration,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            tap_timeout: Duration::from_millis(180),
            touch_slop: 16.0,
            min_fling_velocity: 400.0,
            velocity_window: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Default)]
pub struct GestureInterpreter {
    thresholds: GestureThresholds,
    primary: Option<PointerId>,
    secondary: Option<PointerId>,
    down_time: Duration,
    down_pos: Point,
    last_pos: Point,
    travel: f64,
    initial_angle: f64,
    samples: VecDeque<(Duration, Point)>,
}

fn angle(a: Point, b: Point) -> f64 {
    (a.y - b.y).atan2(a.x - b.x).to_degrees()
}

impl GestureInterpreter {
    pub fn new(thresholds: GestureThresholds) -> Self {
        Self {
            thresholds,
            ..Self::default()
        }
    }

    pub fn thresholds(&self) -> &GestureThresholds {
        &self.thresholds
    }

    /// Whether a primary pointer is currently being tracked.
    pub fn is_tracking(&self) -> bool {
        self.primary.is_some()
    }

    fn reset(&mut self) {
        self.primary = None;
        self.secondary = None;
        self.travel = 0.0;
        self.initial_angle = 0.0;
        self.samples.clear();
    }

    fn record(&mut self, time: Duration, pos: Point) {
        self.samples.push_back((time, pos));
        while let Some(&(t, _)) = self.samples.front() {
            if time.saturating_sub(t) > self.thresholds.velocity_window && self.samples.len() > 2 {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Release velocity over the recent sample window.
    fn velocity(&self) -> Vec2 {
        let (Some(&(t0, p0)), Some(&(t1, p1))) = (self.samples.front(), self.samples.back()) else {
            return Vec2::ZERO;
        };
        let dt = t1.saturating_sub(t0).as_secs_f64();
        if dt <= 0.0 {
            return Vec2::ZERO;
        }
        (p1 - p0) / dt
    }

    fn two_pointer_angle(&self, event: &PointerEvent) -> Option<f64> {
        let a = event.position(self.primary?)?;
        let b = event.position(self.secondary?)?;
        Some(angle(a, b))
    }

    pub fn on_event(&mut self, event: &PointerEvent) -> Vec<GestureEvent> {
        match event.action {
            PointerAction::Down => {
                self.reset();
                let Some(pos) = event.position(event.pointer) else {
                    return Vec::new();
                };
                self.primary = Some(event.pointer);
                self.down_time = event.time;
                self.down_pos = pos;
                self.last_pos = pos;
                self.record(event.time, pos);
                vec![GestureEvent::Down { pos }]
            }
            PointerAction::PointerDown => {
                if self.primary.is_some() && self.secondary.is_none() {
                    self.secondary = Some(event.pointer);
                    self.initial_angle = self.two_pointer_angle(event).unwrap_or(0.0);
                }
                Vec::new()
            }
            PointerAction::Move => {
                let Some(pos) = self.primary.and_then(|p| event.position(p)) else {
                    return Vec::new();
                };
                let delta = pos - self.last_pos;
                self.last_pos = pos;
                self.travel = self.travel.max(pos.distance(self.down_pos));
                self.record(event.time, pos);
                let mut out = vec![GestureEvent::Move { pos, delta }];
                if let Some(current) = self.two_pointer_angle(event) {
                    out.push(GestureEvent::MultiRotate {
                        degrees: current - self.initial_angle,
                    });
                }
                out
            }
            PointerAction::PointerUp => {
                if self.secondary == Some(event.pointer) {
                    self.secondary = None;
                    return vec![GestureEvent::RotateEnd];
                }
                if self.primary == Some(event.pointer) {
                    let Some(next) = self.secondary.take() else {
                        return Vec::new();
                    };
                    self.primary = Some(next);
                    if let Some(pos) = event.position(next) {
                        self.last_pos = pos;
                    }
                    // The new primary did not start this gesture
                    self.travel = f64::INFINITY;
                    self.samples.clear();
                    return vec![GestureEvent::RotateEnd];
                }
                Vec::new()
            }
            PointerAction::Up => {
                let Some(primary) = self.primary else {
                    return Vec::new();
                };
                let pos = event.position(primary).unwrap_or(self.last_pos);
                self.travel = self.travel.max(pos.distance(self.down_pos));
                self.record(event.time, pos);
                let velocity = self.velocity();
                let elapsed = event.time.saturating_sub(self.down_time);
                let gesture = if velocity.hypot() > self.thresholds.min_fling_velocity {
                    GestureEvent::Fling { pos, velocity }
                } else if elapsed < self.thresholds.tap_timeout
                    && self.travel < self.thresholds.touch_slop
                {
                    GestureEvent::Tap { pos }
                } else {
                    GestureEvent::Up { pos }
                };
                self.reset();
                vec![gesture]
            }
            PointerAction::Cancel => {
                self.reset();
                Vec::new()
            }
        }
    }
}
