//! Activity state machine
//!
//! Tracks what the backend is doing with the active take: whether capture is
//! running and where detector processing stands. The capture session is the
//! only writer; navigation and guards read it through a watch channel.

use crate::events::{CaptureEvent, ProcessingEvent};

/// Capture lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapturePhase {
    /// No capture has run for this take
    #[default]
    Idle,
    /// Frames are being written
    Capturing,
    /// Capture ended
    Stopped,
}

/// Detector processing phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingPhase {
    /// Not started
    #[default]
    Idle,
    /// Processing in progress
    Running,
    /// Processing finished
    Completed,
    /// Processing failed
    Failed,
    /// Processing stopped on request
    Stopped,
}

/// Activity of the backend for the active take
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivityState {
    /// Active take
    pub take_id: Option<String>,

    /// Capture phase
    pub capture: CapturePhase,

    /// Processing phase
    pub processing: ProcessingPhase,

    /// Last authoritative frame count
    pub frame_count: u64,

    /// Frames processed so far
    pub processed: u64,

    /// Frames to process
    pub processing_total: u64,

    /// Last processing failure
    pub last_error: Option<String>,
}

impl ActivityState {
    /// Create an idle state for `take_id`
    pub fn for_take(take_id: impl Into<String>) -> Self {
        Self {
            take_id: Some(take_id.into()),
            ..Default::default()
        }
    }

    /// Whether capture is running
    pub fn is_capturing(&self) -> bool {
        self.capture == CapturePhase::Capturing
    }

    /// Whether processing is running
    pub fn is_processing(&self) -> bool {
        self.processing == ProcessingPhase::Running
    }

    /// Whether any remote operation is in flight
    pub fn is_busy(&self) -> bool {
        self.is_capturing() || self.is_processing()
    }

    /// Whether `take_id` is the active take
    pub fn is_take(&self, take_id: &str) -> bool {
        self.take_id.as_deref() == Some(take_id)
    }

    /// Apply a capture event for the active take
    ///
    /// Returns `false` if the event belongs to another take.
    pub fn apply_capture(&mut self, event: &CaptureEvent) -> bool {
        if !self.is_take(event.take_id()) {
            return false;
        }

        match event {
            CaptureEvent::Started { .. } => {
                self.capture = CapturePhase::Capturing;
                self.frame_count = 0;
            }
            CaptureEvent::FrameCount { count, .. } => {
                if self.capture != CapturePhase::Capturing {
                    self.capture = CapturePhase::Capturing;
                }
                self.frame_count = *count;
            }
            CaptureEvent::Stopped { frame_count, .. } => {
                self.capture = CapturePhase::Stopped;
                if let Some(count) = frame_count {
                    self.frame_count = *count;
                }
            }
        }
        true
    }

    /// Apply a processing event for the active take
    ///
    /// Returns `false` if the event belongs to another take.
    pub fn apply_processing(&mut self, event: &ProcessingEvent) -> bool {
        if !self.is_take(event.take_id()) {
            return false;
        }

        match event {
            ProcessingEvent::Started { .. } => {
                self.processing = ProcessingPhase::Running;
                self.processed = 0;
                self.last_error = None;
            }
            ProcessingEvent::Progress {
                processed, total, ..
            } => {
                self.processing = ProcessingPhase::Running;
                self.processed = *processed;
                self.processing_total = *total;
            }
            ProcessingEvent::Completed { .. } => {
                self.processing = ProcessingPhase::Completed;
                self.processed = self.processing_total.max(self.processed);
            }
            ProcessingEvent::Failed { error, .. } => {
                self.processing = ProcessingPhase::Failed;
                self.last_error = error.clone();
            }
            ProcessingEvent::Stopped { .. } => {
                self.processing = ProcessingPhase::Stopped;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_lifecycle() {
        let mut state = ActivityState::for_take("7");
        assert!(!state.is_busy());

        state.apply_capture(&CaptureEvent::Started {
            take_id: "7".into(),
            frame_rate: Some(24.0),
        });
        assert!(state.is_capturing());

        state.apply_capture(&CaptureEvent::FrameCount {
            take_id: "7".into(),
            count: 48,
            timestamp: None,
        });
        assert_eq!(state.frame_count, 48);

        state.apply_capture(&CaptureEvent::Stopped {
            take_id: "7".into(),
            frame_count: Some(50),
        });
        assert_eq!(state.capture, CapturePhase::Stopped);
        assert_eq!(state.frame_count, 50);
        assert!(!state.is_busy());
    }

    #[test]
    fn test_frame_count_implies_capturing() {
        let mut state = ActivityState::for_take("7");

        state.apply_capture(&CaptureEvent::FrameCount {
            take_id: "7".into(),
            count: 12,
            timestamp: None,
        });

        assert!(state.is_capturing());
    }

    #[test]
    fn test_processing_lifecycle() {
        let mut state = ActivityState::for_take("3");

        state.apply_processing(&ProcessingEvent::Progress {
            take_id: "3".into(),
            processed: 10,
            total: 40,
        });
        assert!(state.is_processing());
        assert!(state.is_busy());

        state.apply_processing(&ProcessingEvent::Failed {
            take_id: "3".into(),
            error: Some("detector crashed".into()),
        });
        assert_eq!(state.processing, ProcessingPhase::Failed);
        assert_eq!(state.last_error.as_deref(), Some("detector crashed"));

        state.apply_processing(&ProcessingEvent::Started {
            take_id: "3".into(),
        });
        assert!(state.last_error.is_none());

        state.apply_processing(&ProcessingEvent::Completed {
            take_id: "3".into(),
        });
        assert_eq!(state.processing, ProcessingPhase::Completed);
    }

    #[test]
    fn test_other_take_ignored() {
        let mut state = ActivityState::for_take("1");

        let applied = state.apply_capture(&CaptureEvent::Started {
            take_id: "2".into(),
            frame_rate: None,
        });

        assert!(!applied);
        assert!(!state.is_capturing());
    }
}
