//! Rendering mode: per-edge software overlays or one hardware layer.
//!
//! The mode follows the display's decoration capability. Capability is
//! only re-queried when the display's unique id changes; repeated
//! notifications for the same display are free.

use serde::{Deserialize, Serialize};

/// Pixel format of the hardware decoration buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferFormat {
    R8,
    Rgba8888,
}

/// How the compositor reads the decoration buffer's alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphaInterpretation {
    #[default]
    Coverage,
    Mask,
}

/// Hardware decoration capability reported by a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecorationSupport {
    pub format: BufferFormat,
    #[serde(default)]
    pub alpha_interpretation: AlphaInterpretation,
}

/// Rendering path for decorations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorMode {
    /// Up to four independent edge surfaces.
    #[default]
    Software,
    /// A single hardware-composited decoration layer.
    Hardware,
}

/// A change of rendering mode the orchestrator must carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTransition {
    EnterHardware,
    EnterSoftware,
}

/// Tracks decoration capability keyed on the display's unique id.
#[derive(Debug, Clone, Default)]
pub struct CapabilityTracker {
    last_unique_id: Option<String>,
    support: Option<DecorationSupport>,
}

impl CapabilityTracker {
    pub fn mode(&self) -> DecorMode {
        if self.support.is_some() {
            DecorMode::Hardware
        } else {
            DecorMode::Software
        }
    }

    pub fn support(&self) -> Option<DecorationSupport> {
        self.support
    }

    /// Observe the current display. `query` runs only when `unique_id`
    /// differs from the last observed id.
    ///
    /// Returns the mode transition implied by a changed capability, if
    /// any. A changed buffer format within hardware mode is recorded but
    /// is not a transition.
    pub fn observe<F>(&mut self, unique_id: &str, query: F) -> Option<ModeTransition>
    where
        F: FnOnce() -> Option<DecorationSupport>,
    {
        if self.last_unique_id.as_deref() == Some(unique_id) {
            return None;
        }
        self.last_unique_id = Some(unique_id.to_string());

        let before = self.mode();
        self.support = query();
        let after = self.mode();
        tracing::debug!(unique_id, support = ?self.support, "decoration capability queried");

        match (before, after) {
            (DecorMode::Software, DecorMode::Hardware) => Some(ModeTransition::EnterHardware),
            (DecorMode::Hardware, DecorMode::Software) => Some(ModeTransition::EnterSoftware),
            _ => None,
        }
    }

    /// Forget the observed display so the next observation re-queries.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
