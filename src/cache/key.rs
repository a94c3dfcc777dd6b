//! Cache key types
//!
//! A frame is identified by the take it belongs to, its index within the
//! take and the rendition being displayed.

/// Rendition of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameVariant {
    /// Full-resolution captured frame
    Full,
    /// Reduced-size preview used for scrubbing
    Thumbnail,
    /// Frame with detector overlay from background processing
    Processed,
}

impl FrameVariant {
    /// Name used in logs and remote paths
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameVariant::Full => "full",
            FrameVariant::Thumbnail => "thumbnail",
            FrameVariant::Processed => "processed",
        }
    }
}

/// Unique identifier for a cached frame (take + index + variant)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameKey {
    /// Take identifier
    pub take_id: String,
    /// Zero-based frame index within the take
    pub index: usize,
    /// Rendition
    pub variant: FrameVariant,
}

impl FrameKey {
    /// Create a new frame key
    pub fn new(take_id: impl Into<String>, index: usize, variant: FrameVariant) -> Self {
        Self {
            take_id: take_id.into(),
            index,
            variant,
        }
    }

    /// Key for a neighboring index of the same take and variant
    pub fn with_index(&self, index: usize) -> Self {
        Self {
            take_id: self.take_id.clone(),
            index,
            variant: self.variant,
        }
    }
}

impl std::fmt::Display for FrameKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.take_id, self.index, self.variant.as_str())
    }
}
