//! Client-side real-time state synchronization for capture and review
//!
//! Keeps a displayed frame index, a capture progress counter and
//! navigability state consistent with a remote capture/processing backend
//! that reports through a one-way event stream.
//!
//! - [`cache`]: bounded frame blob cache with FIFO eviction
//! - [`events`]: receive-only event stream client with reconnect
//! - [`progress`]: frame count prediction reconciled against the backend
//! - [`navigation`]: frame cursor, loading and preloading
//! - [`guard`]: navigation guards that can stop running operations
//! - [`session`]: wiring from events to activity state and progress

pub mod cache;
pub mod error;
pub mod events;
pub mod guard;
pub mod navigation;
pub mod progress;
pub mod remote;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
