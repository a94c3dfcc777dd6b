//! Event stream client configuration

use std::time::Duration;

/// Event stream client configuration options
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Retry in the background after a failed connect or a dropped stream
    pub reconnect_on_error: bool,

    /// Delay before the first reconnect attempt
    pub reconnect_base_delay: Duration,

    /// Upper bound for the exponential backoff delay
    pub reconnect_max_delay: Duration,

    /// Reconnect attempts before giving up (per outage)
    pub max_reconnect_attempts: u32,

    /// Connect must complete within this time
    pub connect_timeout: Duration,

    /// Number of recent message ids remembered for duplicate suppression
    pub dedup_window: usize,

    /// Buffered messages between transport and dispatcher
    pub channel_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            reconnect_on_error: true,
            reconnect_base_delay: Duration::from_millis(500),
            reconnect_max_delay: Duration::from_secs(30),
            max_reconnect_attempts: 10,
            connect_timeout: Duration::from_secs(10),
            dedup_window: 256,
            channel_capacity: 256,
        }
    }
}

impl ClientConfig {
    /// Enable or disable background reconnect
    pub fn reconnect_on_error(mut self, enabled: bool) -> Self {
        self.reconnect_on_error = enabled;
        self
    }

    /// Set the backoff bounds
    pub fn reconnect_delay(mut self, base: Duration, max: Duration) -> Self {
        self.reconnect_base_delay = base;
        self.reconnect_max_delay = max.max(base);
        self
    }

    /// Set the maximum number of reconnect attempts
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set duplicate suppression window (minimum 1)
    pub fn dedup_window(mut self, size: usize) -> Self {
        self.dedup_window = size.max(1);
        self
    }

    /// Backoff delay before reconnect attempt `attempt` (1-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.reconnect_base_delay
            .saturating_mul(1u32 << shift)
            .min(self.reconnect_max_delay)
    }
}
