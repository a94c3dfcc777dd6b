//! Navigation controller configuration

use std::time::Duration;

use crate::cache::{FrameVariant, DEFAULT_CACHE_SIZE};

/// Navigation controller configuration options
#[derive(Debug, Clone)]
pub struct NavigationConfig {
    /// Frames kept in the blob cache
    pub cache_size: usize,

    /// Neighbors preloaded on each side of a loaded frame
    pub preload_radius: usize,

    /// Primary loads must complete within this time
    pub load_timeout: Duration,

    /// Rendition loaded for display
    pub variant: FrameVariant,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            preload_radius: 3,
            load_timeout: Duration::from_secs(10),
            variant: FrameVariant::Full,
        }
    }
}

impl NavigationConfig {
    /// Set the cache size (minimum 1)
    pub fn cache_size(mut self, size: usize) -> Self {
        self.cache_size = size.max(1);
        self
    }

    /// Set the preload radius (0 disables preloading)
    pub fn preload_radius(mut self, radius: usize) -> Self {
        self.preload_radius = radius;
        self
    }

    /// Set the primary load timeout
    pub fn load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Set the displayed rendition
    pub fn variant(mut self, variant: FrameVariant) -> Self {
        self.variant = variant;
        self
    }
}
