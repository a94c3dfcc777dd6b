//! Event transport abstraction
//!
//! A transport opens one receive-only stream of messages. The client hands it
//! the channel set of its subscription table and the last message id seen, so
//! a fresh connection can be scoped and resumed without subscribers taking
//! part.

use std::future::Future;

use tokio::sync::mpsc;

use crate::error::TransportError;

use super::message::EventMessage;

/// Messages from one physical connection; `None` or `Err` ends it
pub type EventReceiver = mpsc::Receiver<Result<EventMessage, TransportError>>;

/// Parameters for opening a connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Channels with at least one live subscription, in subscription order
    pub channels: Vec<String>,
    /// Last message id delivered, for resume
    pub last_event_id: Option<String>,
}

/// Receive-only push channel
pub trait EventTransport: Send + Sync + 'static {
    /// Open a new connection
    fn open(
        &self,
        request: ConnectRequest,
    ) -> impl Future<Output = Result<EventReceiver, TransportError>> + Send;
}
