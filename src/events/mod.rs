//! Push event channel client
//!
//! A single long-lived, receive-only connection delivers channel-tagged
//! messages (`capture_events`, `processing_events`, `take_<id>`). The client
//! owns the subscription table and fans each message out to the handlers of
//! its channel.
//!
//! # Architecture
//!
//! ```text
//!   EventTransport::open(ConnectRequest { channels, last_event_id })
//!            │
//!            ▼
//!     mpsc::Receiver<EventMessage> ──► pump task ──► dedup by id
//!                                                        │
//!                         ┌──────────────────────────────┤
//!                         ▼                              ▼
//!                 handlers("capture_events")     handlers("take_7")
//! ```
//!
//! When the stream drops, the pump task reconnects with exponential backoff
//! and reopens with the same channel set. Messages already delivered before
//! the drop are suppressed by id.

pub mod client;
pub mod config;
pub mod http;
pub mod message;
pub mod sse;
pub mod subscription;
pub mod transport;

pub use client::{ConnectionState, EventStreamClient};
pub use config::ClientConfig;
pub use http::HttpEventTransport;
pub use message::{
    take_channel, CaptureEvent, EventMessage, ProcessingEvent, CAPTURE_CHANNEL,
    PROCESSING_CHANNEL,
};
pub use sse::{SseDecoder, DEFAULT_CHANNEL, DEFAULT_MAX_LINE_LENGTH};
pub use subscription::{EventHandler, Subscription};
pub use transport::{ConnectRequest, EventReceiver, EventTransport};
