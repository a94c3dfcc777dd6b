//! Event messages and typed payloads
//!
//! Messages arrive tagged with a channel name (the SSE `event` field). The
//! payload is JSON; capture and processing channels decode into the typed
//! enums below.

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Channel carrying capture lifecycle and frame counts
pub const CAPTURE_CHANNEL: &str = "capture_events";

/// Channel carrying detector processing progress
pub const PROCESSING_CHANNEL: &str = "processing_events";

/// Channel name for events scoped to a single take
pub fn take_channel(take_id: &str) -> String {
    format!("take_{}", take_id)
}

/// A message delivered by the event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessage {
    /// Channel the message was published on
    pub channel: String,
    /// Server-assigned id, used for duplicate suppression and resume
    pub id: Option<String>,
    /// Raw payload
    pub data: String,
}

impl EventMessage {
    /// Create a new message
    pub fn new(channel: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            id: None,
            data: data.into(),
        }
    }

    /// Attach a message id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Decode the payload as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.data)
    }
}

/// Capture lifecycle events
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CaptureEvent {
    /// Capture started for a take
    Started {
        take_id: String,
        /// Nominal capture rate in frames per second
        #[serde(default)]
        frame_rate: Option<f64>,
    },
    /// Authoritative count of frames written so far
    FrameCount {
        take_id: String,
        count: u64,
        /// Server wall-clock time in seconds, informational
        #[serde(default)]
        timestamp: Option<f64>,
    },
    /// Capture stopped
    Stopped {
        take_id: String,
        /// Final number of frames in the take
        #[serde(default)]
        frame_count: Option<u64>,
    },
}

impl CaptureEvent {
    /// Take the event refers to
    pub fn take_id(&self) -> &str {
        match self {
            CaptureEvent::Started { take_id, .. }
            | CaptureEvent::FrameCount { take_id, .. }
            | CaptureEvent::Stopped { take_id, .. } => take_id,
        }
    }
}

/// Detector processing events
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcessingEvent {
    /// Processing started (or restarted) for a take
    Started { take_id: String },
    /// Frames processed so far
    Progress {
        take_id: String,
        processed: u64,
        total: u64,
    },
    /// Processing finished
    Completed { take_id: String },
    /// Processing failed
    Failed {
        take_id: String,
        #[serde(default)]
        error: Option<String>,
    },
    /// Processing stopped on request
    Stopped { take_id: String },
}

impl ProcessingEvent {
    /// Take the event refers to
    pub fn take_id(&self) -> &str {
        match self {
            ProcessingEvent::Started { take_id }
            | ProcessingEvent::Progress { take_id, .. }
            | ProcessingEvent::Completed { take_id }
            | ProcessingEvent::Failed { take_id, .. }
            | ProcessingEvent::Stopped { take_id } => take_id,
        }
    }

    /// Whether processing is still running after this event
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            ProcessingEvent::Started { .. } | ProcessingEvent::Progress { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_channel() {
        assert_eq!(take_channel("42"), "take_42");
    }

    #[test]
    fn test_decode_capture_events() {
        let msg = EventMessage::new(
            CAPTURE_CHANNEL,
            r#"{"type":"frame_count","take_id":"7","count":120,"timestamp":1700000000.5}"#,
        );
        let event: CaptureEvent = msg.json().unwrap();
        assert_eq!(
            event,
            CaptureEvent::FrameCount {
                take_id: "7".into(),
                count: 120,
                timestamp: Some(1700000000.5),
            }
        );

        let msg = EventMessage::new(CAPTURE_CHANNEL, r#"{"type":"started","take_id":"7"}"#);
        let event: CaptureEvent = msg.json().unwrap();
        assert_eq!(event.take_id(), "7");
        assert!(matches!(event, CaptureEvent::Started { frame_rate: None, .. }));
    }

    #[test]
    fn test_decode_processing_events() {
        let msg = EventMessage::new(
            PROCESSING_CHANNEL,
            r#"{"type":"progress","take_id":"3","processed":10,"total":50}"#,
        );
        let event: ProcessingEvent = msg.json().unwrap();
        assert!(event.is_running());

        let msg = EventMessage::new(PROCESSING_CHANNEL, r#"{"type":"failed","take_id":"3"}"#);
        let event: ProcessingEvent = msg.json().unwrap();
        assert!(!event.is_running());
        assert_eq!(event.take_id(), "3");
    }

    #[test]
    fn test_unknown_type_is_error() {
        let msg = EventMessage::new(CAPTURE_CHANNEL, r#"{"type":"exploded","take_id":"1"}"#);
        assert!(msg.json::<CaptureEvent>().is_err());
    }
}
