//! Navigation guards
//!
//! Before a view change is committed, every registered guard is asked for
//! permission in registration order.
//!
//! ```text
//!   request_navigation(target)
//!        │  busy? ──► Err(GuardBusy)
//!        ▼
//!   Evaluating: guard[0] ──true──► guard[1] ──true──► ... ──► Approved
//!                  │false           │false
//!                  ▼                ▼
//!               Blocked          Blocked        (later guards not invoked)
//! ```
//!
//! Guards may show a confirmation and stop a remote operation before they
//! resolve. Those side effects are not cancelled; navigation proceeds only
//! after they settle.

pub mod config;
pub mod operation;
pub mod registry;

pub use config::GuardConfig;
pub use operation::{OperationGuard, OperationKind};
pub use registry::{
    GuardFuture, GuardPredicate, GuardRegistration, NavigationGuardRegistry, PendingNavigation,
};
