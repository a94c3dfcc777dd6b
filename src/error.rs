//! Error types
//!
//! A single crate-level `Error` with nested error types for the transport
//! and frame-fetch paths. Fetch and transport errors are `Clone` because they
//! travel through shared in-flight results.

use std::time::Duration;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Clone)]
pub enum Error {
    /// Event channel connect or read failure
    Transport(TransportError),
    /// Operation not supported by a receive-only channel
    UnsupportedOperation(&'static str),
    /// Frame or preview load failure
    Fetch(FetchError),
    /// A navigation request is already being evaluated
    GuardBusy,
    /// A guard could not halt an active remote operation
    StopOperationFailed {
        /// Operation that was being stopped ("capture", "processing")
        operation: &'static str,
        /// Failure description
        reason: String,
    },
    /// Frame navigation is disabled while capture is running
    NavigationLocked,
    /// Preferences could not be read or parsed
    Preferences(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Transport(e) => write!(f, "Transport error: {}", e),
            Error::UnsupportedOperation(op) => {
                write!(f, "Unsupported operation on receive-only channel: {}", op)
            }
            Error::Fetch(e) => write!(f, "Fetch error: {}", e),
            Error::GuardBusy => write!(f, "Navigation request already in progress"),
            Error::StopOperationFailed { operation, reason } => {
                write!(f, "Failed to stop {}: {}", operation, reason)
            }
            Error::NavigationLocked => write!(f, "Navigation is locked while capturing"),
            Error::Preferences(msg) => write!(f, "Preferences error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Transport(e) => Some(e),
            Error::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Transport(err)
    }
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        Error::Fetch(err)
    }
}

/// Event transport errors
#[derive(Debug, Clone)]
pub enum TransportError {
    /// Could not establish the connection
    ConnectFailed(String),
    /// Connect did not complete in time
    ConnectTimeout(Duration),
    /// Server answered with a non-success status
    BadStatus(u16),
    /// Response was not an event stream
    InvalidResponse(String),
    /// Connection dropped while streaming
    Closed,
    /// I/O failure while reading
    Io(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::ConnectFailed(msg) => write!(f, "connect failed: {}", msg),
            TransportError::ConnectTimeout(d) => write!(f, "connect timed out after {:?}", d),
            TransportError::BadStatus(code) => write!(f, "unexpected HTTP status {}", code),
            TransportError::InvalidResponse(msg) => write!(f, "invalid response: {}", msg),
            TransportError::Closed => write!(f, "connection closed"),
            TransportError::Io(msg) => write!(f, "i/o error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            TransportError::BadStatus(status.as_u16())
        } else if err.is_connect() || err.is_builder() {
            TransportError::ConnectFailed(err.to_string())
        } else {
            TransportError::Io(err.to_string())
        }
    }
}

/// Frame load errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Remote returned an error for the frame
    Remote(String),
    /// Frame does not exist on the backend
    NotFound,
    /// Primary load exceeded its deadline
    Timeout(Duration),
    /// Index is outside the take's frame range
    OutOfRange { index: usize, frame_count: usize },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Remote(msg) => write!(f, "remote error: {}", msg),
            FetchError::NotFound => write!(f, "frame not found"),
            FetchError::Timeout(d) => write!(f, "frame load timed out after {:?}", d),
            FetchError::OutOfRange { index, frame_count } => {
                write!(f, "frame {} out of range (frame count {})", index, frame_count)
            }
        }
    }
}

impl std::error::Error for FetchError {}
