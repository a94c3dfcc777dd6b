//! Frame navigation
//!
//! The controller owns the cursor of the active take, refuses to move while
//! capture is running and loads frames through the blob cache with per-key
//! fetch sharing, supersession and neighbor preloading.

pub mod config;
pub mod controller;
pub mod cursor;
pub mod prefs;

pub use config::NavigationConfig;
pub use controller::{FrameNavigationController, LoadOutcome};
pub use cursor::{FrameIndexCursor, NavTarget};
pub use prefs::{HotkeyAction, Preferences};
