//! `text/event-stream` decoder
//!
//! Incremental decoder for the Server-Sent Events wire format. Bytes may be
//! fed in arbitrary chunks; complete events are returned as soon as their
//! terminating blank line has been seen. A line longer than the configured
//! maximum is discarded up to its newline. `retry` hints are ignored; the
//! client's own backoff governs reconnects.
//!
//! ```text
//! event: capture_events      -> channel
//! id: 1042                   -> message id (resume id is sticky)
//! data: {"type":"frame_count",
//! data:  "count":120}        -> data lines joined with '\n'
//! <blank line>               -> dispatch
//! ```

use bytes::{Buf, BytesMut};

use super::message::EventMessage;

/// Channel used when an event carries no `event` field
pub const DEFAULT_CHANNEL: &str = "message";

/// Longest line kept by default
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Incremental SSE decoder
#[derive(Debug)]
pub struct SseDecoder {
    buffer: BytesMut,
    /// Prefix of `buffer` already searched for a newline
    scanned: usize,
    max_line_length: usize,
    /// Dropping the rest of an oversized line
    discarding: bool,
    event_type: Option<String>,
    data: String,
    has_data: bool,
    event_id: Option<String>,
    last_event_id: Option<String>,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line_length(DEFAULT_MAX_LINE_LENGTH)
    }
}

impl SseDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder that discards lines longer than `max` bytes
    pub fn with_max_line_length(max: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            scanned: 0,
            max_line_length: max.max(1),
            discarding: false,
            event_type: None,
            data: String::new(),
            has_data: false,
            event_id: None,
            last_event_id: None,
        }
    }

    /// Feed raw bytes, returning every event they complete
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<EventMessage> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') {
            let pos = self.scanned + offset;
            self.scanned = 0;

            let mut line = self.buffer.split_to(pos + 1);
            if self.discarding {
                self.discarding = false;
                continue;
            }

            line.truncate(pos);
            if line.last() == Some(&b'\r') {
                line.truncate(pos - 1);
            }

            let line = String::from_utf8_lossy(&line).into_owned();
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        self.scanned = self.buffer.len();

        if self.buffer.len() > self.max_line_length {
            tracing::warn!(
                buffered = self.buffer.len(),
                max = self.max_line_length,
                "Discarding oversized SSE line"
            );
            self.buffer.clear();
            self.scanned = 0;
            self.discarding = true;
        }

        events
    }

    /// Last id seen on the stream
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Bytes buffered without a terminating newline
    pub fn pending(&self) -> usize {
        self.buffer.remaining()
    }

    fn process_line(&mut self, line: &str) -> Option<EventMessage> {
        if line.is_empty() {
            return self.dispatch();
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.find(':') {
            Some(idx) => {
                let value = &line[idx + 1..];
                (&line[..idx], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line, ""),
        };

        match field {
            "event" => self.event_type = Some(value.to_string()),
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = if value.is_empty() {
                        None
                    } else {
                        Some(value.to_string())
                    };
                    self.event_id = self.last_event_id.clone();
                }
            }
            _ => {
                tracing::trace!(field = field, "Ignoring unknown SSE field");
            }
        }

        None
    }

    fn dispatch(&mut self) -> Option<EventMessage> {
        let event_type = self.event_type.take();
        let event_id = self.event_id.take();

        if !self.has_data {
            return None;
        }

        let data = std::mem::take(&mut self.data);
        self.has_data = false;

        let channel = match event_type {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_CHANNEL.to_string(),
        };

        Some(EventMessage {
            channel,
            id: event_id,
            data,
        })
    }
}
