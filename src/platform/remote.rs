//! Platform backed by the connected platform peer.
//!
//! Calls are buffered as [`PlatformCommand`]s in an outbox. The engine
//! loop drains the outbox after every request and forwards the commands
//! to the platform connection. Display queries answer from the last
//! display report the peer pushed.

use crate::decor::edge::{CutoutBounds, Rect, Rotation, Size};
use crate::decor::mode::DecorationSupport;
use crate::decor::provider::DecorProvider;

use super::{
    DisplayInfo, DisplaySource, PlatformCommand, SurfaceHandle, SurfaceService, SurfaceTarget,
    TunerService,
};

#[derive(Debug, Default)]
pub struct RemotePlatform {
    display: DisplayInfo,
    outbox: Vec<PlatformCommand>,
    next_handle: u64,
}

impl RemotePlatform {
    pub fn new() -> Self {
        Self {
            display: DisplayInfo::default(),
            outbox: Vec::new(),
            next_handle: 1,
        }
    }

    /// Replace the display report.
    pub fn set_display(&mut self, display: DisplayInfo) {
        self.display = display;
    }

    /// Take every command issued since the last drain, in order.
    pub fn drain(&mut self) -> Vec<PlatformCommand> {
        std::mem::take(&mut self.outbox)
    }
}

impl SurfaceService for RemotePlatform {
    fn create_surface(&mut self, target: SurfaceTarget) -> SurfaceHandle {
        let handle = SurfaceHandle(self.next_handle);
        self.next_handle += 1;
        self.outbox
            .push(PlatformCommand::CreateSurface { handle, target });
        handle
    }

    fn destroy_surface(&mut self, handle: SurfaceHandle) {
        self.outbox.push(PlatformCommand::DestroySurface { handle });
    }

    fn set_visibility(&mut self, handle: SurfaceHandle, visible: bool) {
        self.outbox
            .push(PlatformCommand::SetVisibility { handle, visible });
    }

    fn update_content(&mut self, handle: SurfaceHandle, providers: &[DecorProvider]) {
        self.outbox.push(PlatformCommand::UpdateContent {
            handle,
            providers: providers.to_vec(),
        });
    }

    fn update_camera_protection(&mut self, handle: SurfaceHandle, bounds: Option<Rect>) {
        self.outbox
            .push(PlatformCommand::UpdateCameraProtection { handle, bounds });
    }
}

impl DisplaySource for RemotePlatform {
    fn decoration_support(&self) -> Option<DecorationSupport> {
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

impl TunerService for RemotePlatform {
    fn add_tunable(&mut self, key: &str) {
        self.outbox
            .push(PlatformCommand::AddTunable { key: key.into() });
    }

    fn remove_tunable(&mut self, key: &str) {
        self.outbox
            .push(PlatformCommand::RemoveTunable { key: key.into() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decor::edge::Edge;

    #[test]
    fn handles_are_unique_and_commands_ordered() {
        let mut platform = RemotePlatform::new();
        let a = platform.create_surface(SurfaceTarget::Edge { edge: Edge::Top });
        let b = platform.create_surface(SurfaceTarget::Hardware);
        assert_ne!(a, b);
        platform.set_visibility(a, true);
        platform.destroy_surface(b);

        let cmds = platform.drain();
        assert_eq!(cmds.len(), 4);
        assert_eq!(
            cmds[0],
            PlatformCommand::CreateSurface {
                handle: a,
                target: SurfaceTarget::Edge { edge: Edge::Top }
            }
        );
        assert_eq!(cmds[3], PlatformCommand::DestroySurface { handle: b });
    }

    #[test]
    fn drain_empties_outbox() {
        let mut platform = RemotePlatform::new();
        platform.add_tunable("k");
        assert_eq!(platform.drain().len(), 1);
        assert!(platform.drain().is_empty());
    }

    #[test]
    fn display_queries_follow_report() {
        let mut platform = RemotePlatform::new();
        platform.set_display(DisplayInfo {
            rotation: Rotation::Deg180,
            unique_id: "d7".into(),
            natural_size: Size::new(10, 20),
            ..DisplayInfo::default()
        });
        assert_eq!(platform.rotation(), Rotation::Deg180);
        assert_eq!(DisplaySource::unique_id(&platform), "d7");
        assert!(platform.decoration_support().is_none());
    }
}
