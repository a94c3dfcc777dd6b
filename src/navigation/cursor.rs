//! Bounded frame index cursor

/// Navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    /// One frame forward
    Next,
    /// One frame back
    Previous,
    /// First frame
    First,
    /// Last frame
    Last,
    /// Relative step (negative steps back)
    Offset(i64),
    /// Absolute index
    Index(usize),
}

/// Current frame index within `[0, frame_count - 1]`
///
/// With no frames the cursor rests at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameIndexCursor {
    current: usize,
    frame_count: usize,
}

impl FrameIndexCursor {
    /// Create a cursor at the first frame
    pub fn new(frame_count: usize) -> Self {
        Self {
            current: 0,
            frame_count,
        }
    }

    /// Current index
    pub fn current(&self) -> usize {
        self.current
    }

    /// Number of frames
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Whether there are no frames
    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// Last valid index
    pub fn last_index(&self) -> usize {
        self.frame_count.saturating_sub(1)
    }

    /// Clamp `index` into bounds
    pub fn clamp(&self, index: usize) -> usize {
        index.min(self.last_index())
    }

    /// Index a navigation request resolves to, clamped
    pub fn resolve(&self, target: NavTarget) -> usize {
        match target {
            NavTarget::Next => self.clamp(self.current.saturating_add(1)),
            NavTarget::Previous => self.current.saturating_sub(1),
            NavTarget::First => 0,
            NavTarget::Last => self.last_index(),
            NavTarget::Offset(step) => {
                let magnitude = step.unsigned_abs() as usize;
                if step >= 0 {
                    self.clamp(self.current.saturating_add(magnitude))
                } else {
                    self.current.saturating_sub(magnitude)
                }
            }
            NavTarget::Index(index) => self.clamp(index),
        }
    }

    /// Move to `index`, clamped; returns the new index
    pub fn set(&mut self, index: usize) -> usize {
        self.current = self.clamp(index);
        self.current
    }

    /// Change the number of frames, keeping the index in bounds
    pub fn set_frame_count(&mut self, frame_count: usize) {
        self.frame_count = frame_count;
        self.current = self.clamp(self.current);
    }

    /// Back to the first frame with a new frame count
    pub fn reset(&mut self, frame_count: usize) {
        self.frame_count = frame_count;
        self.current = 0;
    }
}
