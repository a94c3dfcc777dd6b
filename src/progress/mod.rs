//! Capture progress prediction
//!
//! Frame counts arrive from the backend at irregular intervals. Between
//! them the displayed count is extrapolated from elapsed time and the
//! nominal capture rate; each authoritative count pulls the display toward
//! it through a short ease-out transition.
//!
//! ```text
//!   count
//!    24 ┤          ╭──╮
//!       │        ╭─╯   ╲        predicted (floor(t * rate))
//!    20 ┤      ╭─╯      ╰────   authoritative 20 at t=1s
//!       │    ╭─╯
//!     0 ┼────┴────┬─────────── t
//!       0        1s
//! ```

pub mod config;
pub mod predictor;
pub mod tracker;
pub mod transition;

pub use config::PredictorConfig;
pub use predictor::{confidence, CaptureProgressState, ProgressPredictor};
pub use tracker::{ProgressCommand, ProgressSnapshot, ProgressTracker};
pub use transition::{ease_out_cubic, Transition};
