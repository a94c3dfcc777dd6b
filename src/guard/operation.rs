//! Guard for running capture and processing operations
//!
//! While the guarded operation is active, leaving the view asks the user
//! whether to stop it. Navigation proceeds only once the stop request has
//! settled; a failed or timed-out stop keeps navigation blocked. A stop
//! request runs on its own task, so it completes even when the navigation
//! request is dropped or times out.
//!
//! ```text
//!   inactive ──────────────────────────────────────────► allow
//!   active ──► confirm? ──cancel──────────────────────► block
//!                 │confirm
//!                 ▼
//!           still active? ──no─────────────────────────► allow
//!                 │yes
//!                 ▼
//!           stop (bounded) ──ok────────────────────────► allow
//!                 └──────error / timeout──► StopOperationFailed
//! ```

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::remote::{ConfirmPrompt, Confirmation, OperationControl};
use crate::session::ActivityState;

use super::config::GuardConfig;
use super::registry::{GuardRegistration, NavigationGuardRegistry};

/// Remote operation a guard protects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Video capture
    Capture,
    /// Detector processing
    Processing,
}

impl OperationKind {
    /// Name used in logs and errors
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Capture => "capture",
            OperationKind::Processing => "processing",
        }
    }

    /// Whether the operation is running in `state`
    pub fn is_active(&self, state: &ActivityState) -> bool {
        match self {
            OperationKind::Capture => state.is_capturing(),
            OperationKind::Processing => state.is_processing(),
        }
    }

    /// Prompt shown before stopping the operation
    pub fn prompt(&self) -> ConfirmPrompt {
        match self {
            OperationKind::Capture => ConfirmPrompt::new(
                "Stop capture?",
                "Capture is still running. Leaving this page stops the capture.",
            )
            .labels("Stop capture", "Stay"),
            OperationKind::Processing => ConfirmPrompt::new(
                "Stop processing?",
                "Detector processing is still running. Leaving this page stops it.",
            )
            .labels("Stop processing", "Stay"),
        }
    }
}

async fn stop_operation<C: OperationControl>(
    kind: OperationKind,
    control: Arc<C>,
    take_id: String,
) -> std::result::Result<(), String> {
    let result = match kind {
        OperationKind::Capture => control.stop_capture(&take_id).await,
        OperationKind::Processing => control.stop_processing(&take_id).await,
    };
    tracing::debug!(operation = kind.as_str(), take = %take_id, ok = result.is_ok(), "Stop request settled");
    result
}

/// Navigation guard that stops an active operation on confirmation
pub struct OperationGuard<C, D> {
    kind: OperationKind,
    control: Arc<C>,
    confirmation: Arc<D>,
    activity: watch::Receiver<ActivityState>,
    config: GuardConfig,
}

impl<C: OperationControl, D: Confirmation> OperationGuard<C, D> {
    /// Create a guard for `kind`
    pub fn new(
        kind: OperationKind,
        control: Arc<C>,
        confirmation: Arc<D>,
        activity: watch::Receiver<ActivityState>,
    ) -> Self {
        Self {
            kind,
            control,
            confirmation,
            activity,
            config: GuardConfig::default(),
        }
    }

    /// Set the guard configuration
    pub fn with_config(mut self, config: GuardConfig) -> Self {
        self.config = config;
        self
    }

    /// Operation this guard protects
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Register on `registry` under `id`
    pub fn register(self, registry: &NavigationGuardRegistry, id: impl Into<String>) -> GuardRegistration {
        let guard = Arc::new(self);
        registry.register(id, move |target| {
            let guard = Arc::clone(&guard);
            async move { guard.check(&target).await }
        })
    }

    /// Decide whether navigation to `target` may proceed
    pub async fn check(&self, target: &str) -> Result<bool> {
        if self.active_take().is_none() {
            return Ok(true);
        }

        let operation = self.kind.as_str();
        if !self.confirmation.confirm(self.kind.prompt()).await {
            tracing::info!(operation = operation, target = %target, "Stop declined, navigation blocked");
            return Ok(false);
        }

        // The operation may have ended while the dialog was open
        let Some(take_id) = self.active_take() else {
            tracing::debug!(operation = operation, "Operation ended during confirmation");
            return Ok(true);
        };

        let timeout = self.config.stop_timeout;
        let stop = tokio::spawn(stop_operation(
            self.kind,
            Arc::clone(&self.control),
            take_id.clone(),
        ));

        // A timeout detaches the stop request; it still runs to completion
        match tokio::time::timeout(timeout, stop).await {
            Ok(Ok(Ok(()))) => {
                tracing::info!(operation = operation, take = %take_id, "Operation stopped for navigation");
                Ok(true)
            }
            Ok(Ok(Err(reason))) => {
                tracing::warn!(operation = operation, take = %take_id, reason = %reason, "Stop failed");
                Err(Error::StopOperationFailed { operation, reason })
            }
            Ok(Err(e)) => {
                tracing::warn!(operation = operation, take = %take_id, error = %e, "Stop task failed");
                Err(Error::StopOperationFailed {
                    operation,
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                tracing::warn!(operation = operation, take = %take_id, "Stop timed out");
                Err(Error::StopOperationFailed {
                    operation,
                    reason: format!("no response within {:?}", timeout),
                })
            }
        }
    }

    fn active_take(&self) -> Option<String> {
        let state = self.activity.borrow();
        if self.kind.is_active(&state) {
            state.take_id.clone()
        } else {
            None
        }
    }
}
