//! Decor providers: descriptors of one decoration and the edges it may
//! attach to.
//!
//! A provider is immutable and cheap. Factories rebuild them on every
//! composition pass; the engine only keeps the ones attached to a live
//! surface. Identity is the typed [`ViewId`], which also fixes the
//! provider's [`ProviderKind`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::edge::{Edge, Rect, Size};

/// One of the four display corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// The two edges meeting at this corner: TOP/BOTTOM first, then
    /// LEFT/RIGHT.
    pub fn edges(self) -> [Edge; 2] {
        match self {
            Corner::TopLeft => [Edge::Top, Edge::Left],
            Corner::TopRight => [Edge::Top, Edge::Right],
            Corner::BottomLeft => [Edge::Bottom, Edge::Left],
            Corner::BottomRight => [Edge::Bottom, Edge::Right],
        }
    }

    pub fn is_top(self) -> bool {
        matches!(self, Corner::TopLeft | Corner::TopRight)
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Corner::TopLeft => "top_left",
            Corner::TopRight => "top_right",
            Corner::BottomLeft => "bottom_left",
            Corner::BottomRight => "bottom_right",
        };
        f.write_str(name)
    }
}

/// Stable identity of a decoration view.
///
/// Two providers with the same id describe the same view, so surfaces
/// holding that id do not need rebuilding when geometry changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewId {
    RoundedCorner { corner: Corner },
    PrivacyDot { corner: Corner },
    CutoutFill { edge: Edge },
    FaceScanning { edge: Edge },
}

impl ViewId {
    pub fn kind(self) -> ProviderKind {
        match self {
            ViewId::RoundedCorner { .. } => ProviderKind::RoundedCorner,
            ViewId::PrivacyDot { .. } => ProviderKind::PrivacyDot,
            ViewId::CutoutFill { .. } => ProviderKind::CutoutFill,
            ViewId::FaceScanning { .. } => ProviderKind::FaceScanning,
        }
    }
}

/// `kind:position`, e.g. `privacy_dot:top_left` or `cutout_fill:top`.
impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewId::RoundedCorner { corner } => write!(f, "rounded_corner:{corner}"),
            ViewId::PrivacyDot { corner } => write!(f, "privacy_dot:{corner}"),
            ViewId::CutoutFill { edge } => write!(f, "cutout_fill:{edge}"),
            ViewId::FaceScanning { edge } => write!(f, "face_scanning:{edge}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid view id {0:?} (expected kind:position, e.g. privacy_dot:top_left)")]
pub struct ParseViewIdError(String);

impl FromStr for ViewId {
    type Err = ParseViewIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseViewIdError(s.to_string());
        let (kind, position) = s.split_once(':').ok_or_else(err)?;
        let corner = || {
            Corner::ALL
                .into_iter()
                .find(|c| c.to_string() == position)
                .ok_or_else(err)
        };
        let edge = || position.parse::<Edge>().map_err(|_| err());
        match kind {
            "rounded_corner" => Ok(ViewId::RoundedCorner { corner: corner()? }),
            "privacy_dot" => Ok(ViewId::PrivacyDot { corner: corner()? }),
            "cutout_fill" => Ok(ViewId::CutoutFill { edge: edge()? }),
            "face_scanning" => Ok(ViewId::FaceScanning { edge: edge()? }),
            _ => Err(err()),
        }
    }
}

/// Decoration category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    RoundedCorner,
    CutoutFill,
    PrivacyDot,
    FaceScanning,
}

impl ProviderKind {
    /// Static kinds keep their surface permanently visible. Dynamic
    /// kinds (indicators) show and hide on their own signals.
    pub fn is_static(self) -> bool {
        matches!(self, ProviderKind::RoundedCorner | ProviderKind::CutoutFill)
    }

    /// Corner kinds attach to one of two edges; edge kinds to exactly one.
    pub fn is_corner(self) -> bool {
        matches!(self, ProviderKind::RoundedCorner | ProviderKind::PrivacyDot)
    }
}

/// What the external renderer needs to draw a provider's view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderContent {
    RoundedCorner { size: Size, padding: u32 },
    PrivacyDot,
    CutoutFill { bounds: Rect },
    FaceScanning { bounds: Rect },
}

/// Descriptor of one decoration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecorProvider {
    view_id: ViewId,
    aligned_edges: Vec<Edge>,
    content: ProviderContent,
}

impl DecorProvider {
    /// A corner decoration aligned to both edges of `corner`.
    pub fn corner(view_id: ViewId, corner: Corner, content: ProviderContent) -> Self {
        Self {
            view_id,
            aligned_edges: corner.edges().to_vec(),
            content,
        }
    }

    /// An edge decoration aligned to exactly `edge`.
    pub fn edge(view_id: ViewId, edge: Edge, content: ProviderContent) -> Self {
        Self {
            view_id,
            aligned_edges: vec![edge],
            content,
        }
    }

    pub fn view_id(&self) -> ViewId {
        self.view_id
    }

    pub fn kind(&self) -> ProviderKind {
        self.view_id.kind()
    }

    /// Edges this provider may attach to, in preference order. Never empty.
    pub fn aligned_edges(&self) -> &[Edge] {
        &self.aligned_edges
    }

    pub fn content(&self) -> &ProviderContent {
        &self.content
    }
}

/// A source of decor providers.
///
/// Factories are independent and queried on every composition pass;
/// the union of their providers is the universe for that pass.
pub trait DecorProviderFactory {
    fn has_providers(&self) -> bool;

    fn providers(&self) -> Vec<DecorProvider>;
}
