//! Time-based transform animations.
//!
//! An animation interpolates every transform component from `from` to `to`
//! between `start` and `start + duration`. Each item runs at most one; the
//! table replaces (cancels) the running one before starting another.

use crate::placement::Transform;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// Quadratic ease-out: fast start, gentle landing.
    Decelerate,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Decelerate => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

/// What the table does when an animation runs to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndAction {
    /// Nothing beyond holding the final transform.
    Rest,
    /// Drop finished: become `Placed`, then enforce capacity.
    Settle,
    /// Fling carried the item off the surface: fade it out and launch a
    /// replacement.
    FadeAway,
    /// Fade finished: remove the item and release its bitmap.
    Remove,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub from: Transform,
    pub to: Transform,
    pub start: Duration,
    pub duration: Duration,
    pub easing: Easing,
    pub end: EndAction,
}

impl Animation {
    pub fn new(
        from: Transform,
        to: Transform,
        start: Duration,
        duration: Duration,
        easing: Easing,
        end: EndAction,
    ) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            easing,
            end,
        }
    }

    /// Linear progress in `[0, 1]` at `now`.
    pub fn progress(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        now >= self.start + self.duration
    }

    pub fn sample(&self, now: Duration) -> Transform {
        if self.is_finished(now) {
            return self.to;
        }
        self.from.lerp(&self.to, self.easing.apply(self.progress(now)))
    }

    pub fn end_time(&self) -> Duration {
        self.start + self.duration
    }
}
