//! In-process platform that records every call.
//!
//! Backs `decord simulate` and the orchestrator tests. Besides the raw
//! command log it tracks live surfaces, their visibility and the active
//! tunables so tests can assert on end state as well as exact call
//! counts.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};

use crate::decor::edge::{CutoutBounds, Rect, Rotation, Size};
use crate::decor::mode::DecorationSupport;
use crate::decor::provider::DecorProvider;

use super::{
    DisplayInfo, DisplaySource, PlatformCommand, SurfaceHandle, SurfaceService, SurfaceTarget,
    TunerService,
};

/// A surface the recording platform considers alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSurface {
    pub target: SurfaceTarget,
    pub visible: bool,
    pub providers: Vec<DecorProvider>,
    pub camera_protection: Option<Rect>,
}

#[derive(Debug, Default)]
pub struct RecordingPlatform {
    display: DisplayInfo,
    commands: Vec<PlatformCommand>,
    live: BTreeMap<SurfaceHandle, LiveSurface>,
    tunables: BTreeSet<String>,
    next_handle: u64,
    support_queries: Cell<usize>,
}

impl RecordingPlatform {
    pub fn new(display: DisplayInfo) -> Self {
        Self {
            display,
            next_handle: 1,
            ..Self::default()
        }
    }

    /// Every call made so far, in order.
    pub fn commands(&self) -> &[PlatformCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn live(&self) -> &BTreeMap<SurfaceHandle, LiveSurface> {
        &self.live
    }
}

/// Assertion helpers.
#[cfg(test)]
impl RecordingPlatform {
    pub fn display_mut(&mut self) -> &mut DisplayInfo {
        &mut self.display
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&PlatformCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|c| matches!(c, PlatformCommand::CreateSurface { .. }))
    }

    pub fn destroyed(&self) -> usize {
        self.count(|c| matches!(c, PlatformCommand::DestroySurface { .. }))
    }

    pub fn tunable_adds(&self) -> usize {
        self.count(|c| matches!(c, PlatformCommand::AddTunable { .. }))
    }

    pub fn tunable_removes(&self) -> usize {
        self.count(|c| matches!(c, PlatformCommand::RemoveTunable { .. }))
    }

    /// How often the display's decoration support was queried.
    pub fn support_queries(&self) -> usize {
        self.support_queries.get()
    }

    /// The live surface on `edge`, if any.
    pub fn edge_surface(&self, edge: crate::decor::edge::Edge) -> Option<&LiveSurface> {
        self.live
            .values()
            .find(|s| s.target == SurfaceTarget::Edge { edge })
    }

    pub fn hardware_surface(&self) -> Option<&LiveSurface> {
        self.live
            .values()
            .find(|s| s.target == SurfaceTarget::Hardware)
    }

    /// Per-edge presence and visibility: `None` when absent.
    pub fn edge_visibility(&self) -> [Option<bool>; 4] {
        crate::decor::edge::Edge::ALL.map(|edge| self.edge_surface(edge).map(|s| s.visible))
    }

    pub fn is_subscribed(&self, key: &str) -> bool {
        self.tunables.contains(key)
    }
}

impl SurfaceService for RecordingPlatform {
    /// # Panics
    ///
    /// Panics if a second live surface is created for the same target.
    fn create_surface(&mut self, target: SurfaceTarget) -> SurfaceHandle {
        assert!(
            self.live.values().all(|s| s.target != target),
            "two live surfaces for {target:?}"
        );
        let handle = SurfaceHandle(self.next_handle);
        self.next_handle += 1;
        self.live.insert(
            handle,
            LiveSurface {
                target,
                visible: false,
                providers: Vec::new(),
                camera_protection: None,
            },
        );
        self.commands
            .push(PlatformCommand::CreateSurface { handle, target });
        handle
    }

    fn destroy_surface(&mut self, handle: SurfaceHandle) {
        self.live.remove(&handle);
        self.commands.push(PlatformCommand::DestroySurface { handle });
    }

    fn set_visibility(&mut self, handle: SurfaceHandle, visible: bool) {
        if let Some(surface) = self.live.get_mut(&handle) {
            surface.visible = visible;
        }
        self.commands
            .push(PlatformCommand::SetVisibility { handle, visible });
    }

    fn update_content(&mut self, handle: SurfaceHandle, providers: &[DecorProvider]) {
        if let Some(surface) = self.live.get_mut(&handle) {
            surface.providers = providers.to_vec();
        }
        self.commands.push(PlatformCommand::UpdateContent {
            handle,
            providers: providers.to_vec(),
        });
    }

    fn update_camera_protection(&mut self, handle: SurfaceHandle, bounds: Option<Rect>) {
        if let Some(surface) = self.live.get_mut(&handle) {
            surface.camera_protection = bounds;
        }
        self.commands
            .push(PlatformCommand::UpdateCameraProtection { handle, bounds });
    }
}

impl DisplaySource for RecordingPlatform {
    fn decoration_support(&self) -> Option<DecorationSupport> {
        self.support_queries.set(self.support_queries.get() + 1);
        self.display.decoration_support()
    }

    fn rotation(&self) -> Rotation {
        self.display.rotation()
    }

    fn unique_id(&self) -> String {
        self.display.unique_id()
    }

    fn cutout_bounds(&self) -> CutoutBounds {
        self.display.cutout_bounds()
    }

    fn natural_size(&self) -> Size {
        self.display.natural_size()
    }
}

impl TunerService for RecordingPlatform {
    fn add_tunable(&mut self, key: &str) {
        self.tunables.insert(key.to_string());
        self.commands
            .push(PlatformCommand::AddTunable { key: key.into() });
    }

    fn remove_tunable(&mut self, key: &str) {
        self.tunables.remove(key);
        self.commands
            .push(PlatformCommand::RemoveTunable { key: key.into() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decor::edge::Edge;

    #[test]
    fn tracks_live_surfaces() {
        let mut platform = RecordingPlatform::new(DisplayInfo::default());
        let top = platform.create_surface(SurfaceTarget::Edge { edge: Edge::Top });
        platform.set_visibility(top, true);
        assert_eq!(platform.edge_visibility(), [None, Some(true), None, None]);

        platform.destroy_surface(top);
        assert!(platform.live().is_empty());
        assert_eq!(platform.created(), 1);
        assert_eq!(platform.destroyed(), 1);
    }

    #[test]
    #[should_panic(expected = "two live surfaces")]
    fn duplicate_edge_surface_panics() {
        let mut platform = RecordingPlatform::new(DisplayInfo::default());
        platform.create_surface(SurfaceTarget::Edge { edge: Edge::Left });
        platform.create_surface(SurfaceTarget::Edge { edge: Edge::Left });
    }

    #[test]
    fn counts_support_queries() {
        let platform = RecordingPlatform::new(DisplayInfo::default());
        assert_eq!(platform.support_queries(), 0);
        let _ = platform.decoration_support();
        assert_eq!(platform.support_queries(), 1);
    }

    #[test]
    fn tracks_tunables() {
        let mut platform = RecordingPlatform::new(DisplayInfo::default());
        platform.add_tunable("k");
        assert!(platform.is_subscribed("k"));
        platform.remove_tunable("k");
        assert!(!platform.is_subscribed("k"));
        assert_eq!(platform.tunable_adds(), 1);
        assert_eq!(platform.tunable_removes(), 1);
    }
}
