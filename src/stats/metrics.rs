//! Counters for cache and event-stream behaviour

/// Frame cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Handles installed
    pub inserts: u64,
    /// Existing entries replaced by a new handle for the same key
    pub replacements: u64,
    /// Entries evicted to respect the size bound
    pub evictions: u64,
    /// Handles released (eviction, replacement, removal, clear)
    pub releases: u64,
    /// Release attempts on an already-released handle
    pub double_releases: u64,
}

impl CacheStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of lookups that hit, in `[0, 1]`
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Event stream client statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientStats {
    /// Successful connections, including reconnects
    pub connections: u64,
    /// Reconnect attempts after a drop or failed connect
    pub reconnect_attempts: u64,
    /// Messages received from the transport
    pub messages_received: u64,
    /// Handler invocations
    pub deliveries: u64,
    /// Messages dropped because their id was already seen
    pub duplicates_dropped: u64,
}

impl ClientStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.hit_ratio(), 0.0);
    }

    #[test]
    fn test_cache_stats_hit_ratio() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };

        assert!((stats.hit_ratio() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_client_stats_new() {
        let stats = ClientStats::new();
        assert_eq!(stats.connections, 0);
        assert_eq!(stats.duplicates_dropped, 0);
    }
}
