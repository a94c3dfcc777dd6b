//! Time-parameterized smoothing transition
//!
//! A transition interpolates from a start value toward a target with an
//! ease-out cubic curve. It holds no timer of its own; any periodic tick can
//! sample it.

use std::time::Duration;

use tokio::time::Instant;

/// Ease-out cubic on `[0, 1]`
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Transition from `from` toward a target over `duration`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// Value at `start`
    pub from: f64,
    /// When the transition began
    pub start: Instant,
    /// Length of the transition
    pub duration: Duration,
}

impl Transition {
    /// Create a transition starting at `now`
    pub fn new(from: f64, now: Instant, duration: Duration) -> Self {
        Self {
            from,
            start: now,
            duration,
        }
    }

    /// A transition that has already settled at `value`
    pub fn settled(value: f64, now: Instant) -> Self {
        Self::new(value, now, Duration::ZERO)
    }

    /// Linear progress in `[0, 1]`
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }

        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Whether the transition has reached its target
    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    /// Value at `now` when heading toward `to`
    ///
    /// The result always lies between `from` and `to`, so a target that moves
    /// during the transition is tracked without overshoot.
    pub fn value_at(&self, now: Instant, to: f64) -> f64 {
        self.from + (to - self.from) * ease_out_cubic(self.progress(now))
    }
}
