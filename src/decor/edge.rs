//! Edge and rotation model: the four display edges and how a display
//! rotation remaps them.
//!
//! Rotation is measured counterclockwise while edges are enumerated
//! clockwise (LEFT, TOP, RIGHT, BOTTOM), so every quarter turn steps
//! an edge index by −1. Platform cutout bounds arrive in the physical
//! (rotation 0) frame and are remapped into the logical frame here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the four display edges. The discriminant is the array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Left = 0,
    Top = 1,
    Right = 2,
    Bottom = 3,
}

impl Edge {
    /// All edges in index order.
    pub const ALL: [Edge; 4] = [Edge::Left, Edge::Top, Edge::Right, Edge::Bottom];

    /// Array index of this edge.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Edge for an array index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 4`. The edge domain is closed; any other
    /// value is a caller bug.
    pub fn from_index(index: usize) -> Self {
        assert!(index < 4, "edge index out of range: {index}");
        Self::ALL[index]
    }

    /// Whether this is TOP or BOTTOM.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Edge::Top | Edge::Bottom)
    }

    /// The edge across the display from this one.
    pub fn opposite(self) -> Self {
        Self::from_index((self.index() + 2) % 4)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Edge::Left => "left",
            Edge::Top => "top",
            Edge::Right => "right",
            Edge::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown edge {0:?} (expected left, top, right or bottom)")]
pub struct ParseEdgeError(String);

impl FromStr for Edge {
    type Err = ParseEdgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Edge::ALL
            .into_iter()
            .find(|edge| edge.to_string() == s)
            .ok_or_else(|| ParseEdgeError(s.to_string()))
    }
}

/// Display rotation in quarter turns (counterclockwise).
///
/// Serialized as degrees (0, 90, 180, 270). Any other value fails to
/// deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    Deg0 = 0,
    Deg90 = 1,
    Deg180 = 2,
    Deg270 = 3,
}

impl Rotation {
    /// All rotations in quarter-turn order.
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Number of counterclockwise quarter turns.
    pub fn quarter_turns(self) -> usize {
        self as usize
    }

    /// Rotation for a quarter-turn count.
    ///
    /// # Panics
    ///
    /// Panics if `turns >= 4`. The rotation domain is closed.
    pub fn from_quarter_turns(turns: usize) -> Self {
        assert!(turns < 4, "rotation out of range: {turns} quarter turns");
        Self::ALL[turns]
    }

    /// The rotation that undoes this one.
    pub fn inverse(self) -> Self {
        Self::from_quarter_turns((4 - self.quarter_turns()) % 4)
    }

    /// Apply `self` then `next`.
    #[cfg(test)]
    pub fn then(self, next: Rotation) -> Self {
        Self::from_quarter_turns((self.quarter_turns() + next.quarter_turns()) % 4)
    }

    /// Whether the display's width and height swap under this rotation.
    #[cfg(test)]
    pub fn is_sideways(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    pub fn degrees(self) -> u16 {
        self.quarter_turns() as u16 * 90
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(format!("invalid rotation: {other} degrees")),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// Remap an edge identity through a display rotation.
///
/// Pure and total. `rotated_edge(e, Deg0) == e`, and composing two
/// rotations equals rotating once by their sum.
pub fn rotated_edge(edge: Edge, rotation: Rotation) -> Edge {
    Edge::from_index((edge.index() + 4 - rotation.quarter_turns()) % 4)
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Size as seen after rotating the display.
    #[cfg(test)]
    pub fn rotated(self, rotation: Rotation) -> Self {
        if rotation.is_sideways() {
            Self::new(self.height, self.width)
        } else {
            self
        }
    }
}

/// Axis-aligned rectangle, `left`/`top` inclusive, `right`/`bottom`
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Rotate this rectangle from the natural (rotation 0) frame of a
    /// display of `natural` size into the frame of `rotation`.
    pub fn rotated(self, natural: Size, rotation: Rotation) -> Self {
        let w = natural.width as i32;
        let h = natural.height as i32;
        let Rect {
            left: l,
            top: t,
            right: r,
            bottom: b,
        } = self;
        match rotation {
            Rotation::Deg0 => self,
            Rotation::Deg90 => Rect::new(t, w - r, b, w - l),
            Rotation::Deg180 => Rect::new(w - r, h - b, w - l, h - t),
            Rotation::Deg270 => Rect::new(h - b, l, h - t, r),
        }
    }
}

/// Cutout bounding rectangles keyed by edge index. `None` (or an empty
/// rectangle) means no cutout on that edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CutoutBounds(pub [Option<Rect>; 4]);

impl CutoutBounds {
    pub fn none() -> Self {
        Self([None; 4])
    }

    /// Bounds on `edge`, if any non-empty rectangle is present.
    pub fn get(&self, edge: Edge) -> Option<Rect> {
        self.0[edge.index()].filter(|r| !r.is_empty())
    }

    pub fn has(&self, edge: Edge) -> bool {
        self.get(edge).is_some()
    }

    pub fn is_empty(&self) -> bool {
        Edge::ALL.iter().all(|&e| !self.has(e))
    }

    /// Remap bounds reported in the physical frame into the logical
    /// frame of `rotation`: the rectangle on physical edge `p` lands on
    /// `rotated_edge(p, rotation)` with its coordinates rotated too.
    pub fn to_logical(&self, natural: Size, rotation: Rotation) -> Self {
        let back = rotation.inverse();
        Self(std::array::from_fn(|i| {
            let physical = rotated_edge(Edge::from_index(i), back);
            self.get(physical).map(|rect| rect.rotated(natural, rotation))
        }))
    }
}
