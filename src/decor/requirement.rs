//! Provider aggregation: from the factories of one pass to a
//! per-edge requirement.
//!
//! Pure and memoryless: the same factories and cutout always give the
//! same requirements. Diffing against the previous pass is the
//! orchestrator's job.
//!
//! Placement: a view lives on exactly one surface.
//! - Edge decorations (cutout fill, face scanning) sit on their single
//!   aligned edge and anchor it.
//! - Corner decorations (rounded corners, privacy dots) anchor the
//!   default pair, TOP/BOTTOM unless the cutout sits only on LEFT/RIGHT.
//! - Each corner decoration then goes to the first anchored edge, in
//!   LEFT, TOP, RIGHT, BOTTOM order, among its two aligned edges.

use std::collections::HashSet;

use super::edge::{CutoutBounds, Edge};
use super::provider::{DecorProvider, DecorProviderFactory};

/// What one edge needs for the current pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeOverlayRequirement {
    /// Whether a surface must exist on this edge.
    pub needed: bool,
    /// Whether the surface is permanently visible.
    pub static_visible: bool,
    /// Providers placed on this edge, in placement order.
    pub attached: Vec<DecorProvider>,
}

impl EdgeOverlayRequirement {
    fn attach(&mut self, provider: DecorProvider) {
        self.needed = true;
        self.static_visible |= provider.kind().is_static();
        self.attached.push(provider);
    }

    /// Whether the edge exists only for indicators and starts hidden.
    pub fn is_dynamic(&self) -> bool {
        self.needed && !self.static_visible
    }
}

/// Per-edge requirements indexed by [`Edge::index`].
pub type Requirements = [EdgeOverlayRequirement; 4];

/// The pair of opposite edges that hosts corner decorations.
///
/// TOP/BOTTOM by default; LEFT/RIGHT when the logical cutout has bounds
/// on a long edge and none on TOP/BOTTOM.
pub fn default_pair(cutout: &CutoutBounds) -> [Edge; 2] {
    let on = |horizontal: bool| {
        Edge::ALL
            .into_iter()
            .any(|e| e.is_horizontal() == horizontal && cutout.has(e))
    };
    let anchor = if on(false) && !on(true) { Edge::Left } else { Edge::Top };
    [anchor, anchor.opposite()]
}

/// Aggregate every factory's providers into per-edge requirements.
///
/// `cutout` is the logical-frame cutout of this pass.
pub fn aggregate(
    factories: &[Box<dyn DecorProviderFactory>],
    cutout: &CutoutBounds,
) -> Requirements {
    let providers: Vec<DecorProvider> = factories
        .iter()
        .filter(|f| f.has_providers())
        .flat_map(|f| f.providers())
        .collect();

    let mut anchored = [false; 4];
    let mut has_corner = false;
    for provider in &providers {
        if provider.kind().is_corner() {
            has_corner = true;
        } else if let Some(&edge) = provider.aligned_edges().first() {
            anchored[edge.index()] = true;
        }
    }
    if has_corner {
        for edge in default_pair(cutout) {
            anchored[edge.index()] = true;
        }
    }

    let mut requirements: Requirements = Default::default();
    let mut placed = HashSet::new();
    for provider in providers {
        if !placed.insert(provider.view_id()) {
            tracing::debug!(view = ?provider.view_id(), "duplicate provider ignored");
            continue;
        }
        let target = if provider.kind().is_corner() {
            provider
                .aligned_edges()
                .iter()
                .copied()
                .filter(|e| anchored[e.index()])
                .min()
        } else {
            provider.aligned_edges().first().copied()
        };
        match target {
            Some(edge) => requirements[edge.index()].attach(provider),
            None => {
                tracing::debug!(view = ?provider.view_id(), "provider has no anchored edge");
            }
        }
    }

    requirements
}

/// Whether any edge needs a surface.
pub fn any_needed(requirements: &Requirements) -> bool {
    requirements.iter().any(|r| r.needed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decor::config::DecorConfig;
    use crate::decor::edge::{Rect, Rotation, Size};
    use crate::decor::factory::standard_factories;
    use crate::decor::provider::{Corner, ProviderKind, ViewId};

    const NATURAL: Size = Size {
        width: 100,
        height: 200,
    };

    fn physical_cutout(edges: &[Edge]) -> CutoutBounds {
        let mut bounds = CutoutBounds::none();
        for edge in edges {
            let rect = match edge {
                Edge::Left => Rect::new(0, 50, 1, 60),
                Edge::Top => Rect::new(9, 0, 10, 1),
                Edge::Right => Rect::new(99, 50, 100, 60),
                Edge::Bottom => Rect::new(9, 199, 10, 200),
            };
            bounds.0[edge.index()] = Some(rect);
        }
        bounds
    }

    fn requirements(config: &DecorConfig, cutout_edges: &[Edge], rotation: Rotation) -> Requirements {
        let cutout = physical_cutout(cutout_edges).to_logical(NATURAL, rotation);
        aggregate(&standard_factories(config, cutout, None), &cutout)
    }

    fn needed(reqs: &Requirements) -> [bool; 4] {
        [reqs[0].needed, reqs[1].needed, reqs[2].needed, reqs[3].needed]
    }

    fn config(radius: u32, fill: bool, dot: bool, face: bool) -> DecorConfig {
        DecorConfig {
            radius,
            fill_cutout: fill,
            privacy_dot: dot,
            face_scanning: face,
            ..DecorConfig::default()
        }
    }

    #[test]
    fn nothing_configured_needs_nothing() {
        let reqs = requirements(&config(0, false, false, false), &[], Rotation::Deg0);
        assert!(!any_needed(&reqs));
    }

    #[test]
    fn privacy_dot_only_is_dynamic_top_bottom() {
        let reqs = requirements(&config(0, false, true, false), &[], Rotation::Deg0);
        assert_eq!(needed(&reqs), [false, true, false, true]);
        assert!(reqs[Edge::Top.index()].is_dynamic());
        assert!(reqs[Edge::Bottom.index()].is_dynamic());
        assert_eq!(reqs[Edge::Top.index()].attached.len(), 2);
    }

    #[test]
    fn rounding_is_static_top_bottom() {
        let reqs = requirements(&config(20, false, false, false), &[], Rotation::Deg0);
        assert_eq!(needed(&reqs), [false, true, false, true]);
        assert!(reqs[Edge::Top.index()].static_visible);
        assert!(reqs[Edge::Bottom.index()].static_visible);
    }

    #[test]
    fn short_edge_cutout_with_fill() {
        let reqs = requirements(&config(0, true, false, false), &[Edge::Top], Rotation::Deg0);
        assert_eq!(needed(&reqs), [false, true, false, false]);
        assert!(reqs[Edge::Top.index()].static_visible);
    }

    #[test]
    fn cutout_without_fill_is_not_needed() {
        let reqs = requirements(&config(0, false, false, false), &[Edge::Top], Rotation::Deg0);
        assert!(!any_needed(&reqs));
    }

    #[test]
    fn short_edge_cutout_with_privacy_dot() {
        let reqs = requirements(&config(0, true, true, false), &[Edge::Top], Rotation::Deg0);
        assert_eq!(needed(&reqs), [false, true, false, true]);
        assert!(reqs[Edge::Top.index()].static_visible);
        // Bottom exists only for dots.
        assert!(reqs[Edge::Bottom.index()].is_dynamic());
    }

    #[test]
    fn long_edge_cutout_moves_corners_to_left_right() {
        let reqs = requirements(&config(20, true, true, false), &[Edge::Left], Rotation::Deg0);
        assert_eq!(needed(&reqs), [true, false, true, false]);
        let left_ids: Vec<ViewId> = reqs[Edge::Left.index()]
            .attached
            .iter()
            .map(|p| p.view_id())
            .collect();
        assert!(left_ids.contains(&ViewId::RoundedCorner {
            corner: Corner::TopLeft
        }));
        assert!(left_ids.contains(&ViewId::RoundedCorner {
            corner: Corner::BottomLeft
        }));
        assert!(left_ids.contains(&ViewId::CutoutFill { edge: Edge::Left }));
    }

    #[test]
    fn long_edge_cutout_without_fill_still_picks_left_right() {
        let reqs = requirements(&config(0, false, true, false), &[Edge::Left], Rotation::Deg0);
        assert_eq!(needed(&reqs), [true, false, true, false]);
        assert!(reqs[Edge::Left.index()].is_dynamic());
    }

    #[test]
    fn short_and_long_edge_cutout() {
        let reqs = requirements(
            &config(20, true, false, false),
            &[Edge::Left, Edge::Top],
            Rotation::Deg0,
        );
        assert_eq!(needed(&reqs), [true, true, false, true]);
    }

    #[test]
    fn every_view_is_placed_once() {
        let cases: [&[Edge]; 4] = [&[], &[Edge::Top], &[Edge::Left], &[Edge::Left, Edge::Top]];
        for cutout in cases {
            let reqs = requirements(&config(20, true, true, true), cutout, Rotation::Deg0);
            let mut seen = HashSet::new();
            for req in &reqs {
                for p in &req.attached {
                    assert!(seen.insert(p.view_id()), "{:?} placed twice", p.view_id());
                }
            }
            // 4 corners + 4 dots + one fill and one face scan per cutout edge.
            assert_eq!(seen.len(), 8 + 2 * cutout.len());
        }
    }

    #[test]
    fn face_scanning_alone_is_dynamic_on_cutout_edge() {
        let reqs = requirements(&config(0, false, false, true), &[Edge::Top], Rotation::Deg0);
        assert_eq!(needed(&reqs), [false, true, false, false]);
        let top = &reqs[Edge::Top.index()];
        assert!(top.is_dynamic());
        assert_eq!(top.attached[0].kind(), ProviderKind::FaceScanning);
    }

    #[test]
    fn rotation_moves_cutout_to_rotated_edge() {
        let cfg = config(0, true, false, false);
        let upright = requirements(&cfg, &[Edge::Top], Rotation::Deg0);
        assert_eq!(needed(&upright), [false, true, false, false]);

        let rotated = requirements(&cfg, &[Edge::Top], Rotation::Deg90);
        assert_eq!(needed(&rotated), [true, false, false, false]);
        assert_eq!(
            rotated[Edge::Left.index()].attached[0].view_id(),
            ViewId::CutoutFill { edge: Edge::Left }
        );
    }

    #[test]
    fn needed_iff_some_enabled_provider_aligned_to_edge() {
        let cfg = config(20, true, true, true);
        for rotation in Rotation::ALL {
            let reqs = requirements(&cfg, &[Edge::Top], rotation);
            for edge in Edge::ALL {
                let req = &reqs[edge.index()];
                assert_eq!(req.needed, !req.attached.is_empty());
                assert!(req.attached.iter().all(|p| p.aligned_edges().contains(&edge)));
            }
        }
    }
}
