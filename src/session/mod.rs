//! Capture session synchronization
//!
//! Keeps the activity state of the active take (capture running, processing
//! progress) in step with the event stream and feeds the progress tracker
//! and the navigation controller.

pub mod config;
pub mod state;
pub mod sync;

pub use config::SessionConfig;
pub use state::{ActivityState, CapturePhase, ProcessingPhase};
pub use sync::{CaptureSession, FrameCountListener};
