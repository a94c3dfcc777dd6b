//! Remote collaborators
//!
//! The capture/processing backend and the confirmation dialog live outside
//! this crate. The application implements these traits over its REST client
//! and UI toolkit and injects them into the components that need them.

use std::future::Future;

use bytes::Bytes;

use crate::cache::FrameKey;
use crate::error::FetchError;

/// Source of frame payloads
pub trait FrameSource: Send + Sync + 'static {
    /// Fetch the payload for `key`
    fn fetch_frame(&self, key: &FrameKey) -> impl Future<Output = Result<Bytes, FetchError>> + Send;
}

/// Control over long-running remote operations
pub trait OperationControl: Send + Sync + 'static {
    /// Stop the active capture of `take_id`
    fn stop_capture(&self, take_id: &str) -> impl Future<Output = Result<(), String>> + Send;

    /// Stop detector processing of `take_id`
    fn stop_processing(&self, take_id: &str) -> impl Future<Output = Result<(), String>> + Send;
}

/// Content of a confirmation dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

impl ConfirmPrompt {
    /// Create a prompt with default button labels
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_label: "Confirm".into(),
            cancel_label: "Cancel".into(),
        }
    }

    /// Set the button labels
    pub fn labels(mut self, confirm: impl Into<String>, cancel: impl Into<String>) -> Self {
        self.confirm_label = confirm.into();
        self.cancel_label = cancel.into();
        self
    }
}

/// Confirmation surface presented to the user
pub trait Confirmation: Send + Sync + 'static {
    /// Show `prompt`; resolves `true` if the user confirmed
    fn confirm(&self, prompt: ConfirmPrompt) -> impl Future<Output = bool> + Send;
}
