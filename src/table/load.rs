//! Load slots, tokens and the retry policy.
//!
//! Every load the table issues is identified by a [`LoadToken`]: the slot
//! (the future item's id) plus a generation number. Each retry bumps the
//! generation, and a completion is only applied when its token still matches
//! the slot's current one. Anything else (a slot that was cancelled, a load
//! that raced a shutdown) is discarded and its bitmap dropped.

use super::item::ItemId;
use crate::imaging::DecodedImage;
use crate::source::LoadError;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadToken {
    pub slot: ItemId,
    pub generation: u64,
}

/// A load the runtime should run on a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    pub token: LoadToken,
    pub target_long_side: u32,
    pub target_short_side: u32,
}

/// A finished load, posted back to the table.
#[derive(Debug)]
pub struct Completion {
    pub token: LoadToken,
    pub result: Result<DecodedImage, LoadError>,
}

/// Delay before re-requesting a slot whose load failed.
///
/// Attempts are unbounded. With `multiplier == 1.0` the delay is fixed at
/// `base`; larger multipliers back off geometrically up to `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub base: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(100),
            multiplier: 1.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            base: delay,
            multiplier: 1.0,
            max_delay: delay,
        }
    }

    /// Delay after the `failures`-th consecutive failure (1-based).
    pub fn delay(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(64) as i32;
        let factor = self.multiplier.max(1.0).powi(exponent);
        let nanos = (self.base.as_nanos() as f64 * factor).round();
        let cap = self.max_delay.max(self.base);
        if !nanos.is_finite() || nanos >= cap.as_nanos() as f64 {
            return cap;
        }
        Duration::from_nanos(nanos as u64)
    }
}

/// Book-keeping for one outstanding slot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingLoad {
    pub token: LoadToken,
    pub failures: u32,
    /// Set while waiting out a retry delay; the request is not in flight.
    pub retry_at: Option<Duration>,
}

impl PendingLoad {
    pub fn new(slot: ItemId, generation: u64) -> Self {
        Self {
            token: LoadToken { slot, generation },
            failures: 0,
            retry_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_fixed_100ms() {
        let policy = RetryPolicy::default();
        for failures in [1, 2, 10, 1000] {
            assert_eq!(policy.delay(failures), Duration::from_millis(100));
        }
    }

    #[test]
    fn backoff_is_bounded() {
        let policy = RetryPolicy {
            base: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_millis(1000),
        };
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(4), Duration::from_millis(800));
        assert_eq!(policy.delay(5), Duration::from_millis(1000));
        assert_eq!(policy.delay(u32::MAX), Duration::from_millis(1000));
    }

    #[test]
    fn fixed_policy() {
        let policy = RetryPolicy::fixed(Duration::from_millis(250));
        assert_eq!(policy.delay(7), Duration::from_millis(250));
    }
}
