//! Decoration configuration as delivered by the resource service.

use serde::{Deserialize, Serialize};

use super::edge::Size;

/// Resource parameters that drive decoration.
///
/// Every field defaults to zero/off, so a partially populated message
/// still yields a usable configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorConfig {
    /// Uniform corner radius in pixels.
    pub radius: u32,
    /// Top corner radius; `0` falls back to `radius`.
    pub radius_top: u32,
    /// Bottom corner radius; `0` falls back to `radius`.
    pub radius_bottom: u32,
    /// Intrinsic size of the top corner artwork, if any.
    pub top_corner_size: Option<Size>,
    /// Intrinsic size of the bottom corner artwork, if any.
    pub bottom_corner_size: Option<Size>,
    /// Content padding around rounded corners.
    pub padding: u32,
    /// Whether sensor cutouts are filled.
    pub fill_cutout: bool,
    /// Whether the privacy indicator is enabled.
    pub privacy_dot: bool,
    /// Whether the face-scanning indicator is enabled.
    pub face_scanning: bool,
}
