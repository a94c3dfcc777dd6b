//! Capture session configuration

/// Capture session configuration options
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Rate assumed when a capture reports no nominal frame rate
    pub default_frame_rate: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_frame_rate: 24.0,
        }
    }
}

impl SessionConfig {
    /// Set the fallback frame rate
    pub fn default_frame_rate(mut self, rate: f64) -> Self {
        self.default_frame_rate = rate;
        self
    }
}
