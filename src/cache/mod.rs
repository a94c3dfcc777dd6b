//! Frame blob cache
//!
//! Holds decoded-ready frame payloads for the navigation controller. Every
//! payload is wrapped in a releasable `FrameHandle`; the cache owns the
//! handles and releases them on eviction, replacement, removal and clear.
//!
//! # Eviction
//!
//! ```text
//!   insertion order ──────────────────────────────►
//!   ┌──────┬──────┬──────┬──────┬──────┐
//!   │ f12  │ f13* │ f14  │ f15  │ f16  │   * current (protected)
//!   └──────┴──────┴──────┴──────┴──────┘
//!      ▲
//!      └── evicted first when size > max_size
//! ```
//!
//! Eviction is FIFO by insertion order rather than by access recency: frame
//! scrubbing walks forwards and backwards through neighbors, and preloads
//! around the current index arrive in a predictable order.

pub mod blob;
pub mod key;
pub mod store;

pub use blob::FrameHandle;
pub use key::{FrameKey, FrameVariant};
pub use store::{FrameBlobCache, DEFAULT_CACHE_SIZE};
