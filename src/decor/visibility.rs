//! Edge visibility: static decorations versus indicator-driven ones.
//!
//! An edge carrying a rounded corner or a cutout fill is always
//! visible. An edge that only carries indicators (privacy dots, face
//! scanning) starts hidden and is visible while any of its indicators
//! is shown.

use std::collections::BTreeSet;

use super::provider::ViewId;
use super::requirement::EdgeOverlayRequirement;

/// Receives indicator show/hide signals from the renderer.
///
/// `None` or an id that no live surface hosts is a no-op.
pub trait IndicatorListener {
    fn on_indicator_shown(&mut self, view: Option<ViewId>);

    fn on_indicator_hidden(&mut self, view: Option<ViewId>);
}

/// Visibility state of one live edge surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeVisibility {
    /// Permanently visible; indicator signals are ignored.
    Static,
    /// Visible iff `shown` is non-empty.
    Dynamic { shown: BTreeSet<ViewId> },
}

impl EdgeVisibility {
    pub fn for_requirement(requirement: &EdgeOverlayRequirement) -> Self {
        if requirement.static_visible {
            EdgeVisibility::Static
        } else {
            EdgeVisibility::Dynamic {
                shown: BTreeSet::new(),
            }
        }
    }

    pub fn is_visible(&self) -> bool {
        match self {
            EdgeVisibility::Static => true,
            EdgeVisibility::Dynamic { shown } => !shown.is_empty(),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, EdgeVisibility::Dynamic { .. })
    }

    /// Mark an indicator shown. Returns whether visibility flipped.
    pub fn show(&mut self, view: ViewId) -> bool {
        match self {
            EdgeVisibility::Static => false,
            EdgeVisibility::Dynamic { shown } => {
                let was_visible = !shown.is_empty();
                shown.insert(view);
                !was_visible
            }
        }
    }

    /// Mark an indicator hidden. Returns whether visibility flipped.
    pub fn hide(&mut self, view: ViewId) -> bool {
        match self {
            EdgeVisibility::Static => false,
            EdgeVisibility::Dynamic { shown } => {
                let was_visible = !shown.is_empty();
                shown.remove(&view);
                was_visible && shown.is_empty()
            }
        }
    }

    /// Carry indicator state over to a new requirement for the same
    /// surface, dropping indicators the surface no longer hosts.
    pub fn carried_into(&self, requirement: &EdgeOverlayRequirement) -> Self {
        let mut next = Self::for_requirement(requirement);
        if let (EdgeVisibility::Dynamic { shown: old }, EdgeVisibility::Dynamic { shown }) =
            (self, &mut next)
        {
            let hosted: BTreeSet<ViewId> = requirement
                .attached
                .iter()
                .map(|p| p.view_id())
                .collect();
            shown.extend(old.intersection(&hosted).copied());
        }
        next
    }
}
