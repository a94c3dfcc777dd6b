//! Capture progress prediction and reconciliation
//!
//! The predictor extrapolates a frame count from elapsed time and the
//! nominal capture rate, and reconciles it against authoritative counts
//! pushed by the backend. Time is passed in, so the predictor itself is a
//! plain state machine; the tracker task drives it.
//!
//! # Display modes
//!
//! ```text
//!   start ──► Predicted ──authoritative(n)──► Authoritative(n)
//!                ▲                                  │
//!                └──────── no authority for ────────┘
//!                          longer than staleness
//! ```
//!
//! Both modes move the display through a `Transition`, so switching targets
//! never jumps. In `Predicted` mode the target is re-evaluated at every
//! sample and the display follows `expected` without overshooting it.

use tokio::time::Instant;

use super::config::PredictorConfig;
use super::transition::Transition;

/// Progress state of one active capture
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureProgressState {
    /// When capture started
    pub start_time: Instant,
    /// Nominal capture rate in frames per second
    pub nominal_frame_rate: f64,
    /// Last authoritative count received
    pub last_authoritative_count: Option<u64>,
    /// Arrival time of the last authoritative count
    pub last_authoritative_timestamp: Option<Instant>,
    /// Count shown at the last sample
    pub displayed_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Predicted,
    Authoritative(u64),
}

/// Confidence of a prediction against an authoritative value, in `[0, 1]`
pub fn confidence(predicted: u64, actual: u64) -> f64 {
    if actual == 0 {
        return if predicted == 0 { 1.0 } else { 0.0 };
    }

    let error = (predicted as f64 - actual as f64).abs() / actual as f64;
    (1.0 - error.min(1.0)).clamp(0.0, 1.0)
}

/// Frame count predictor for a single capture at a time
#[derive(Debug)]
pub struct ProgressPredictor {
    config: PredictorConfig,
    state: Option<CaptureProgressState>,
    transition: Option<Transition>,
    target: Target,
    confidence: f64,
}

impl ProgressPredictor {
    /// Create an inactive predictor
    pub fn new(config: PredictorConfig) -> Self {
        Self {
            config,
            state: None,
            transition: None,
            target: Target::Predicted,
            confidence: 0.0,
        }
    }

    /// Get the predictor configuration
    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Whether a capture is being tracked
    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// Current capture state, if active
    pub fn state(&self) -> Option<&CaptureProgressState> {
        self.state.as_ref()
    }

    /// Confidence computed at the last reconciliation
    ///
    /// Zero until the first authoritative count arrives.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Begin tracking a capture started at `now`
    pub fn start(&mut self, now: Instant, nominal_frame_rate: f64) {
        let rate = if nominal_frame_rate.is_finite() && nominal_frame_rate > 0.0 {
            nominal_frame_rate
        } else {
            0.0
        };

        self.state = Some(CaptureProgressState {
            start_time: now,
            nominal_frame_rate: rate,
            last_authoritative_count: None,
            last_authoritative_timestamp: None,
            displayed_count: 0,
        });
        self.transition = Some(Transition::settled(0.0, now));
        self.target = Target::Predicted;
        self.confidence = 0.0;
    }

    /// Stop tracking; the display snaps to zero
    pub fn stop(&mut self) {
        self.state = None;
        self.transition = None;
        self.target = Target::Predicted;
        self.confidence = 0.0;
    }

    /// Count expected at `now` from the last authoritative base
    pub fn expected(&self, now: Instant) -> u64 {
        let Some(state) = &self.state else {
            return 0;
        };

        let (base_count, base_time) = match (
            state.last_authoritative_count,
            state.last_authoritative_timestamp,
        ) {
            (Some(count), Some(at)) => (count, at),
            _ => (0, state.start_time),
        };

        let elapsed = now.saturating_duration_since(base_time).as_secs_f64();
        base_count.saturating_add((elapsed * state.nominal_frame_rate).floor() as u64)
    }

    /// Whether authority is older than the staleness threshold
    pub fn is_stale(&self, now: Instant) -> bool {
        match self.state.as_ref().and_then(|s| s.last_authoritative_timestamp) {
            Some(at) => now.saturating_duration_since(at) > self.config.staleness,
            None => true,
        }
    }

    /// Periodic sample; hands stale authority back to prediction
    pub fn tick(&mut self, now: Instant) -> u64 {
        if self.state.is_none() {
            return 0;
        }

        if let Target::Authoritative(count) = self.target {
            if self.is_stale(now) {
                let from = self.value_at(now);
                self.transition = Some(Transition::new(from, now, self.config.smoothing));
                self.target = Target::Predicted;
                tracing::debug!(last = count, "Authoritative count stale, resuming prediction");
            }
        }

        self.sample(now)
    }

    /// Reconcile against an authoritative count that arrived at `now`
    ///
    /// Returns `true` if the display was retargeted. A count equal to the
    /// last one changes nothing.
    pub fn on_authoritative(&mut self, count: u64, now: Instant) -> bool {
        let Some(state) = &self.state else {
            tracing::debug!(count = count, "Ignoring authoritative count while inactive");
            return false;
        };

        if state.last_authoritative_count == Some(count) {
            tracing::trace!(count = count, "Authoritative count unchanged");
            return false;
        }

        let predicted = self.expected(now);
        let from = self.value_at(now);

        self.confidence = confidence(predicted, count);
        self.transition = Some(Transition::new(from, now, self.config.smoothing));
        self.target = Target::Authoritative(count);

        if let Some(state) = self.state.as_mut() {
            state.last_authoritative_count = Some(count);
            state.last_authoritative_timestamp = Some(now);
        }

        tracing::debug!(
            count = count,
            predicted = predicted,
            confidence = self.confidence,
            "Reconciled capture progress"
        );

        self.sample(now);
        true
    }

    /// Count to display at `now`
    pub fn displayed(&self, now: Instant) -> u64 {
        if self.state.is_none() {
            return 0;
        }
        self.value_at(now).round().max(0.0) as u64
    }

    fn sample(&mut self, now: Instant) -> u64 {
        let displayed = self.displayed(now);
        if let Some(state) = self.state.as_mut() {
            state.displayed_count = displayed;
        }
        displayed
    }

    fn value_at(&self, now: Instant) -> f64 {
        let Some(transition) = &self.transition else {
            return 0.0;
        };

        let to = match self.target {
            Target::Predicted => self.expected(now) as f64,
            Target::Authoritative(count) => count as f64,
        };
        transition.value_at(now, to)
    }
}

impl Default for ProgressPredictor {
    fn default() -> Self {
        Self::new(PredictorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_pure_prediction() {
        let t0 = Instant::now();
        let mut predictor = ProgressPredictor::default();
        predictor.start(t0, 24.0);

        assert_eq!(predictor.displayed(t0), 0);
        assert_eq!(predictor.displayed(t0 + ms(1000)), 24);
        assert_eq!(predictor.displayed(t0 + ms(2500)), 60);
        assert_eq!(predictor.confidence(), 0.0);
    }

    #[test]
    fn test_prediction_is_monotonic() {
        let t0 = Instant::now();
        let mut predictor = ProgressPredictor::default();
        predictor.start(t0, 29.97);

        let mut previous = 0;
        for step in 0..60 {
            let value = predictor.tick(t0 + ms(step * 50));
            assert!(value >= previous);
            previous = value;
        }
        assert!(previous > 0);
    }

    #[test]
    fn test_zero_rate_stays_zero() {
        let t0 = Instant::now();
        let mut predictor = ProgressPredictor::default();
        predictor.start(t0, 0.0);

        assert_eq!(predictor.tick(t0 + ms(5000)), 0);
        assert_eq!(predictor.expected(t0 + ms(5000)), 0);

        predictor.start(t0, f64::NAN);
        assert_eq!(predictor.displayed(t0 + ms(5000)), 0);
    }

    #[test]
    fn test_converges_to_authority_without_overshoot() {
        let t0 = Instant::now();
        let mut predictor = ProgressPredictor::default();
        predictor.start(t0, 24.0);

        let at = t0 + ms(1000);
        assert!(predictor.on_authoritative(20, at));

        // No instant jump
        assert_eq!(predictor.displayed(at), 24);
        let midway = predictor.displayed(at + ms(100));
        assert!(midway > 20 && midway < 24);

        for step in 0..=10 {
            let value = predictor.displayed(at + ms(step * 40));
            assert!((20..=24).contains(&value));
        }

        assert_eq!(predictor.displayed(at + ms(400)), 20);
        assert_eq!(predictor.tick(at + ms(900)), 20);
        assert!((predictor.confidence() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_stale_authority_resumes_prediction() {
        let t0 = Instant::now();
        let mut predictor = ProgressPredictor::default();
        predictor.start(t0, 24.0);
        predictor.on_authoritative(20, t0 + ms(1000));

        // Exactly at the threshold the authority still holds
        assert_eq!(predictor.tick(t0 + ms(2000)), 20);
        assert!(!predictor.is_stale(t0 + ms(2000)));

        predictor.tick(t0 + ms(2100));
        assert!(predictor.displayed(t0 + ms(2100)) == 20);

        // Prediction continues from the authoritative base
        assert_eq!(predictor.displayed(t0 + ms(2500)), 20 + 36);
    }

    #[test]
    fn test_huge_authority_saturates() {
        let t0 = Instant::now();
        let mut predictor = ProgressPredictor::default();
        predictor.start(t0, 24.0);
        predictor.on_authoritative(u64::MAX - 5, t0 + ms(100));

        assert_eq!(predictor.expected(t0 + ms(3000)), u64::MAX);
        predictor.tick(t0 + ms(3000));
        assert!(predictor.displayed(t0 + ms(5000)) >= u64::MAX - 5);
    }

    #[test]
    fn test_regression_is_accepted() {
        let t0 = Instant::now();
        let mut predictor = ProgressPredictor::default();
        predictor.start(t0, 24.0);

        predictor.on_authoritative(100, t0 + ms(1000));
        predictor.on_authoritative(10, t0 + ms(1200));

        assert_eq!(predictor.displayed(t0 + ms(1600)), 10);
        assert_eq!(
            predictor.state().unwrap().last_authoritative_count,
            Some(10)
        );
    }

    #[test]
    fn test_unchanged_authority_is_ignored() {
        let t0 = Instant::now();
        let mut predictor = ProgressPredictor::default();
        predictor.start(t0, 24.0);

        assert!(predictor.on_authoritative(20, t0 + ms(1000)));
        assert!(!predictor.on_authoritative(20, t0 + ms(1500)));
        assert_eq!(
            predictor.state().unwrap().last_authoritative_timestamp,
            Some(t0 + ms(1000))
        );
    }

    #[test]
    fn test_stop_snaps_to_zero() {
        let t0 = Instant::now();
        let mut predictor = ProgressPredictor::default();
        predictor.start(t0, 24.0);
        predictor.on_authoritative(50, t0 + ms(2000));

        predictor.stop();

        assert!(!predictor.is_active());
        assert_eq!(predictor.displayed(t0 + ms(2100)), 0);
        assert_eq!(predictor.tick(t0 + ms(2100)), 0);
        assert!(predictor.state().is_none());
    }

    #[test]
    fn test_inactive_ignores_authority() {
        let mut predictor = ProgressPredictor::default();

        assert!(!predictor.on_authoritative(10, Instant::now()));
        assert!(!predictor.is_active());
    }

    #[test]
    fn test_confidence() {
        assert_eq!(confidence(0, 0), 1.0);
        assert_eq!(confidence(5, 0), 0.0);
        assert!((confidence(24, 20) - 0.8).abs() < 1e-9);
        assert_eq!(confidence(100, 20), 0.0);
        assert_eq!(confidence(20, 20), 1.0);
    }
}
