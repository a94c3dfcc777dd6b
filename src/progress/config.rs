//! Progress predictor configuration

use std::time::Duration;

/// Progress predictor configuration options
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Cadence of the prediction tick
    pub tick_interval: Duration,

    /// Duration of the transition toward a new target
    pub smoothing: Duration,

    /// Authority older than this hands the display back to prediction
    pub staleness: Duration,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            smoothing: Duration::from_millis(400),
            staleness: Duration::from_secs(1),
        }
    }
}

impl PredictorConfig {
    /// Set the tick cadence
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Set the smoothing transition duration
    pub fn smoothing(mut self, duration: Duration) -> Self {
        self.smoothing = duration;
        self
    }

    /// Set the staleness threshold
    pub fn staleness(mut self, threshold: Duration) -> Self {
        self.staleness = threshold;
        self
    }
}
