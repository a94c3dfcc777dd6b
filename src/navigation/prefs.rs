//! Navigation preferences
//!
//! Hotkey bindings and toggles persisted by the application. The navigation
//! layer only reads them.
//!
//! ```json
//! {
//!   "keyboard_frame_stepping": true,
//!   "skip_frames": 10,
//!   "hotkeys": { "ArrowRight": "next_frame", "Shift+ArrowRight": "skip_forward" }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::cursor::NavTarget;

/// Navigation action bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotkeyAction {
    NextFrame,
    PreviousFrame,
    FirstFrame,
    LastFrame,
    SkipForward,
    SkipBackward,
}

impl HotkeyAction {
    /// Navigation request for this action
    pub fn target(&self, skip_frames: usize) -> NavTarget {
        let skip = skip_frames.min(i64::MAX as usize) as i64;
        match self {
            HotkeyAction::NextFrame => NavTarget::Next,
            HotkeyAction::PreviousFrame => NavTarget::Previous,
            HotkeyAction::FirstFrame => NavTarget::First,
            HotkeyAction::LastFrame => NavTarget::Last,
            HotkeyAction::SkipForward => NavTarget::Offset(skip),
            HotkeyAction::SkipBackward => NavTarget::Offset(-skip),
        }
    }
}

/// Persisted navigation preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Whether hotkeys step through frames
    pub keyboard_frame_stepping: bool,

    /// Frames jumped by the skip actions
    pub skip_frames: usize,

    /// Key name to action
    pub hotkeys: HashMap<String, HotkeyAction>,
}

impl Default for Preferences {
    fn default() -> Self {
        let hotkeys = [
            ("ArrowRight", HotkeyAction::NextFrame),
            ("ArrowLeft", HotkeyAction::PreviousFrame),
            ("Home", HotkeyAction::FirstFrame),
            ("End", HotkeyAction::LastFrame),
            ("Shift+ArrowRight", HotkeyAction::SkipForward),
            ("Shift+ArrowLeft", HotkeyAction::SkipBackward),
        ]
        .into_iter()
        .map(|(key, action)| (key.to_string(), action))
        .collect();

        Self {
            keyboard_frame_stepping: true,
            skip_frames: 10,
            hotkeys,
        }
    }
}

impl Preferences {
    /// Parse preferences from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Preferences(e.to_string()))
    }

    /// Read preferences from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Preferences(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Navigation request bound to `key`, if stepping is enabled
    pub fn target_for(&self, key: &str) -> Option<NavTarget> {
        if !self.keyboard_frame_stepping {
            return None;
        }
        self.hotkeys
            .get(key)
            .map(|action| action.target(self.skip_frames))
    }
}
