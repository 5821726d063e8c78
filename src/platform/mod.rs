//! Platform seam: the external services the engine drives.
//!
//! The engine never touches windows, displays or settings directly. It
//! talks to three narrow traits; [`remote::RemotePlatform`] turns the
//! calls into [`PlatformCommand`]s for the connected platform peer and
//! [`recording::RecordingPlatform`] keeps them for inspection.

pub mod recording;
pub mod remote;

use serde::{Deserialize, Serialize};

use crate::decor::edge::{CutoutBounds, Edge, Rect, Rotation, Size};
use crate::decor::mode::DecorationSupport;
use crate::decor::provider::DecorProvider;

/// Opaque handle of a surface created by the surface service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceHandle(pub u64);

/// What a surface decorates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurfaceTarget {
    /// An overlay along one logical edge.
    Edge { edge: Edge },
    /// The single hardware-composited decoration layer.
    Hardware,
}

/// The platform's display report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayInfo {
    #[serde(default)]
    pub rotation: Rotation,
    pub unique_id: String,
    #[serde(default)]
    pub decoration_support: Option<DecorationSupport>,
    pub natural_size: Size,
    /// Cutout bounds keyed by physical edge, rotation-0 frame.
    #[serde(default)]
    pub cutout: CutoutBounds,
}

impl Default for DisplayInfo {
    fn default() -> Self {
        Self {
            rotation: Rotation::Deg0,
            unique_id: String::new(),
            decoration_support: None,
            natural_size: Size::default(),
            cutout: CutoutBounds::none(),
        }
    }
}

/// Window/surface primitives.
pub trait SurfaceService {
    /// Create a surface. New surfaces are hidden and empty.
    fn create_surface(&mut self, target: SurfaceTarget) -> SurfaceHandle;

    /// Destroy a surface. Destroying an unknown handle is a no-op.
    fn destroy_surface(&mut self, handle: SurfaceHandle);

    fn set_visibility(&mut self, handle: SurfaceHandle, visible: bool);

    /// Replace the views drawn on a surface.
    fn update_content(&mut self, handle: SurfaceHandle, providers: &[DecorProvider]);

    /// Set or clear the camera protection path drawn on a surface.
    fn update_camera_protection(&mut self, handle: SurfaceHandle, bounds: Option<Rect>);
}

/// Read access to the current display.
pub trait DisplaySource {
    fn decoration_support(&self) -> Option<DecorationSupport>;

    fn rotation(&self) -> Rotation;

    fn unique_id(&self) -> String;

    /// Cutout bounds in the physical (rotation-0) frame.
    fn cutout_bounds(&self) -> CutoutBounds;

    fn natural_size(&self) -> Size;
}

/// Tunable subscriptions. Values arrive as tuning notifications.
pub trait TunerService {
    fn add_tunable(&mut self, key: &str);

    fn remove_tunable(&mut self, key: &str);
}

/// Everything the orchestrator needs from its host.
pub trait Platform: SurfaceService + DisplaySource + TunerService {}

impl<T: SurfaceService + DisplaySource + TunerService> Platform for T {}

impl DisplaySource for DisplayInfo {
    fn decoration_support(&self) -> Option<DecorationSupport> {
        self.decoration_support
    }

    fn rotation(&self) -> Rotation {
        self.rotation
    }

    fn unique_id(&self) -> String {
        self.unique_id.clone()
    }

    fn cutout_bounds(&self) -> CutoutBounds {
        self.cutout
    }

    fn natural_size(&self) -> Size {
        self.natural_size
    }
}

/// One platform call, as sent to the platform peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PlatformCommand {
    CreateSurface {
        handle: SurfaceHandle,
        target: SurfaceTarget,
    },
    DestroySurface {
        handle: SurfaceHandle,
    },
    SetVisibility {
        handle: SurfaceHandle,
        visible: bool,
    },
    UpdateContent {
        handle: SurfaceHandle,
        providers: Vec<DecorProvider>,
    },
    UpdateCameraProtection {
        handle: SurfaceHandle,
        #[serde(default)]
        bounds: Option<Rect>,
    },
    AddTunable {
        key: String,
    },
    RemoveTunable {
        key: String,
    },
}

impl PlatformCommand {
    /// The surface a command targets, if any.
    pub fn handle(&self) -> Option<SurfaceHandle> {
        match self {
            PlatformCommand::CreateSurface { handle, .. }
            | PlatformCommand::DestroySurface { handle }
            | PlatformCommand::SetVisibility { handle, .. }
            | PlatformCommand::UpdateContent { handle, .. }
            | PlatformCommand::UpdateCameraProtection { handle, .. } => Some(*handle),
            PlatformCommand::AddTunable { .. } | PlatformCommand::RemoveTunable { .. } => None,
        }
    }
}
