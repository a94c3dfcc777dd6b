//! Navigation guard configuration

use std::time::Duration;

/// Operation guard configuration options
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// A stop request must settle within this time
    pub stop_timeout: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_secs(10),
        }
    }
}

impl GuardConfig {
    /// Set the stop timeout
    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GuardConfig::default();

        assert_eq!(config.stop_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_stop_timeout() {
        let config = GuardConfig::default().stop_timeout(Duration::from_secs(3));

        assert_eq!(config.stop_timeout, Duration::from_secs(3));
    }
}
