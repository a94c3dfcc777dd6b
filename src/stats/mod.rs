//! Statistics for the cache and the event client

pub mod metrics;

pub use metrics::{CacheStats, ClientStats};
