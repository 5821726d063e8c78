//! Orchestrator: composition passes, mode transitions and visibility
//! for one display.
//!
//! Every pass recomputes the per-edge requirements from scratch and
//! reconciles live surfaces against them:
//!
//! - software mode: create, update, rebuild or destroy each edge surface;
//!   a surface is rebuilt only when its set of view ids changes.
//! - hardware mode: no edge surfaces, one hardware surface carrying every
//!   provider while anything is needed.
//!
//! The tunable subscription follows whether any surface is live, and is
//! added or removed at most once per transition.
//!
//! Not thread-safe by construction: the engine loop owns it exclusively.

use crate::decor::config::DecorConfig;
use crate::decor::diff::{has_same_providers, has_same_view_ids, view_ids};
use crate::decor::edge::{Edge, Rect, Rotation, Size};
use crate::decor::factory::standard_factories;
use crate::decor::mode::{CapabilityTracker, DecorMode, ModeTransition};
use crate::decor::provider::{DecorProvider, ProviderKind, ViewId};
use crate::decor::requirement::{EdgeOverlayRequirement, Requirements, aggregate, any_needed};
use crate::decor::rounded::{ROUNDED_SIZE_KEY, parse_size_override};
use crate::decor::visibility::{EdgeVisibility, IndicatorListener};
use crate::ipc::protocol::{EdgeDescriptor, SnapshotDescriptor};
use crate::platform::{Platform, SurfaceHandle, SurfaceTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    NotStarted,
    Started,
}

/// Display facts the orchestrator acts on. Mutated only by the display
/// path.
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    pub rotation: Rotation,
    pub natural_size: Size,
    pub capability: CapabilityTracker,
}

impl DisplayState {
    pub fn hardware_decoration_supported(&self) -> bool {
        self.capability.mode() == DecorMode::Hardware
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationState {
    pub tuning_registered: bool,
}

/// A live overlay on one edge.
#[derive(Debug)]
struct EdgeSurface {
    handle: SurfaceHandle,
    providers: Vec<DecorProvider>,
    visibility: EdgeVisibility,
    camera_protection: Option<Rect>,
}

/// The live hardware decoration layer.
#[derive(Debug)]
struct HardwareSurface {
    handle: SurfaceHandle,
    providers: Vec<DecorProvider>,
    camera_protection: Option<Rect>,
}

pub struct Orchestrator<P> {
    platform: P,
    lifecycle: Lifecycle,
    config: DecorConfig,
    display: DisplayState,
    size_override: Option<u32>,
    camera_protection: Option<Rect>,
    requirements: Requirements,
    edges: [Option<EdgeSurface>; 4],
    hardware: Option<HardwareSurface>,
    registration: RegistrationState,
}

impl<P: Platform> Orchestrator<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            lifecycle: Lifecycle::NotStarted,
            config: DecorConfig::default(),
            display: DisplayState::default(),
            size_override: None,
            camera_protection: None,
            requirements: Default::default(),
            edges: Default::default(),
            hardware: None,
            registration: RegistrationState::default(),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_started(&self) -> bool {
        self.lifecycle() == Lifecycle::Started
    }

    pub fn mode(&self) -> DecorMode {
        self.display.capability.mode()
    }

    pub fn registration(&self) -> RegistrationState {
        self.registration
    }

    // -- Operations --

    /// Start decorating. A second call is a no-op.
    pub fn start(&mut self) {
        if self.is_started() {
            tracing::debug!("already started");
            return;
        }
        self.lifecycle = Lifecycle::Started;
        self.sync_geometry();
        self.sync_capability();
        tracing::info!(
            hardware = self.display.hardware_decoration_supported(),
            rotation = ?self.display.rotation,
            "decorations started"
        );
        self.compose();
    }

    /// Apply a new configuration. Before start it is only recorded.
    pub fn on_configuration_changed(&mut self, config: DecorConfig) {
        self.config = config;
        if !self.is_started() {
            tracing::debug!("configuration recorded before start");
            return;
        }
        self.sync_geometry();
        self.compose();
    }

    /// Re-read the display. Capability is re-queried only for a new
    /// unique id; a pass runs whenever started.
    pub fn on_display_changed(&mut self) {
        self.sync_geometry();
        self.sync_capability();
        if self.is_started() {
            self.compose();
        }
    }

    /// Apply a tunable value. Only the rounded-size key is honored.
    pub fn on_tuning_changed(&mut self, key: &str, value: Option<&str>) {
        if key != ROUNDED_SIZE_KEY {
            tracing::debug!(key, "ignoring unrelated tunable");
            return;
        }
        self.size_override = parse_size_override(value);
        tracing::debug!(size_override = ?self.size_override, "rounded size tuning changed");
        if self.is_started() {
            self.compose();
        }
    }

    pub fn show_camera_protection(&mut self, bounds: Rect) {
        self.camera_protection = Some(bounds);
        if self.is_started() {
            self.reconcile_surfaces();
        }
    }

    pub fn hide_camera_protection(&mut self) {
        self.camera_protection = None;
        if !self.is_started() {
            return;
        }
        self.reconcile_surfaces();
        let faces: Vec<ViewId> = self
            .edges
            .iter()
            .flatten()
            .filter_map(|s| face_scanning_view(&s.providers))
            .collect();
        for face in faces {
            self.on_indicator_hidden(Some(face));
        }
    }

    /// Destroy every surface, drop the subscription and return to
    /// not-started. Configuration and display state are kept.
    pub fn shutdown(&mut self) {
        self.release_edges();
        self.release_hardware();
        if self.registration.tuning_registered {
            self.platform.remove_tunable(ROUNDED_SIZE_KEY);
            self.registration.tuning_registered = false;
        }
        self.requirements = Default::default();
        if self.is_started() {
            tracing::info!("decorations stopped");
        }
        self.lifecycle = Lifecycle::NotStarted;
    }

    /// [`shutdown`](Self::shutdown), then forget the display so the next
    /// platform re-reports it from scratch.
    pub fn reset(&mut self) {
        self.shutdown();
        self.display = DisplayState::default();
        self.camera_protection = None;
        self.size_override = None;
    }

    /// Current requirements and surface state.
    pub fn requirement_snapshot(&self) -> SnapshotDescriptor {
        let edges = Edge::ALL
            .into_iter()
            .map(|edge| {
                let req = &self.requirements[edge.index()];
                let surface = self.edges[edge.index()].as_ref();
                EdgeDescriptor {
                    edge,
                    needed: req.needed,
                    static_visible: req.static_visible,
                    surface: surface.map(|s| s.handle),
                    visible: surface.is_some_and(|s| s.visibility.is_visible()),
                    views: req.attached.iter().map(DecorProvider::view_id).collect(),
                }
            })
            .collect();
        SnapshotDescriptor {
            started: self.is_started(),
            mode: self.mode(),
            rotation: self.display.rotation,
            tuning_registered: self.registration().tuning_registered,
            hardware: self.hardware.as_ref().map(|h| h.handle),
            edges,
        }
    }

    /// Whether `candidate` names exactly the views on live surfaces.
    pub fn has_same_providers(&self, candidate: &[ViewId]) -> bool {
        let live = view_ids(
            self.edges
                .iter()
                .flatten()
                .flat_map(|s| s.providers.iter())
                .chain(self.hardware.iter().flat_map(|h| h.providers.iter())),
        );
        has_same_view_ids(&live, candidate)
    }

    // -- Display --

    fn sync_geometry(&mut self) {
        let rotation = self.platform.rotation();
        if rotation != self.display.rotation {
            tracing::debug!(from = ?self.display.rotation, to = ?rotation, "rotation changed");
        }
        self.display.rotation = rotation;
        self.display.natural_size = self.platform.natural_size();
    }

    fn sync_capability(&mut self) {
        let unique_id = self.platform.unique_id();
        let platform = &self.platform;
        let transition = self
            .display
            .capability
            .observe(&unique_id, || platform.decoration_support());
        match transition {
            Some(ModeTransition::EnterHardware) => {
                let support = self.display.capability.support();
                tracing::info!(%unique_id, ?support, "hardware decoration supported, switching modes");
            }
            Some(ModeTransition::EnterSoftware) => {
                tracing::info!(%unique_id, "hardware decoration lost, switching modes");
            }
            None => {}
        }
    }

    // -- Composition --

    fn compose(&mut self) {
        let cutout = self
            .platform
            .cutout_bounds()
            .to_logical(self.display.natural_size, self.display.rotation);
        let factories = standard_factories(&self.config, cutout, self.size_override);
        self.requirements = aggregate(&factories, &cutout);
        self.reconcile_surfaces();
    }

    /// Bring live surfaces in line with the current requirements and
    /// mode, then settle the tunable subscription.
    fn reconcile_surfaces(&mut self) {
        match self.mode() {
            DecorMode::Software => {
                self.release_hardware();
                self.reconcile_edges();
            }
            DecorMode::Hardware => {
                self.release_edges();
                self.reconcile_hardware();
            }
        }
        self.sync_registration();
    }

    fn reconcile_edges(&mut self) {
        for edge in Edge::ALL {
            let i = edge.index();
            let req = self.requirements[i].clone();
            self.edges[i] = match (req.needed, self.edges[i].take()) {
                (true, None) => Some(self.create_edge(edge, &req, None)),
                (true, Some(surface)) if has_same_providers(&surface.providers, &req.attached) => {
                    Some(self.update_edge(surface, &req))
                }
                (true, Some(surface)) => {
                    tracing::debug!(%edge, handle = ?surface.handle, "view set changed, rebuilding");
                    self.platform.destroy_surface(surface.handle);
                    Some(self.create_edge(edge, &req, Some(&surface.visibility)))
                }
                (false, Some(surface)) => {
                    tracing::debug!(%edge, handle = ?surface.handle, "edge no longer needed");
                    self.platform.destroy_surface(surface.handle);
                    None
                }
                (false, None) => None,
            };
        }
    }

    fn create_edge(
        &mut self,
        edge: Edge,
        req: &EdgeOverlayRequirement,
        previous: Option<&EdgeVisibility>,
    ) -> EdgeSurface {
        let mut visibility = match previous {
            Some(prev) => prev.carried_into(req),
            None => EdgeVisibility::for_requirement(req),
        };
        let camera_protection =
            align_face_scanning(&mut visibility, &req.attached, self.camera_protection);

        let handle = self.platform.create_surface(SurfaceTarget::Edge { edge });
        self.platform.update_content(handle, &req.attached);
        self.platform.set_visibility(handle, visibility.is_visible());
        if camera_protection.is_some() {
            self.platform
                .update_camera_protection(handle, camera_protection);
        }
        tracing::debug!(
            %edge,
            ?handle,
            visible = visibility.is_visible(),
            dynamic = visibility.is_dynamic(),
            "edge surface created"
        );

        EdgeSurface {
            handle,
            providers: req.attached.clone(),
            visibility,
            camera_protection,
        }
    }

    fn update_edge(&mut self, mut surface: EdgeSurface, req: &EdgeOverlayRequirement) -> EdgeSurface {
        if surface.providers != req.attached {
            self.platform.update_content(surface.handle, &req.attached);
            surface.providers = req.attached.clone();
        }

        let was_visible = surface.visibility.is_visible();
        let mut visibility = surface.visibility.carried_into(req);
        let camera_protection =
            align_face_scanning(&mut visibility, &req.attached, self.camera_protection);
        if visibility.is_visible() != was_visible {
            self.platform
                .set_visibility(surface.handle, visibility.is_visible());
        }
        surface.visibility = visibility;

        if camera_protection != surface.camera_protection {
            self.platform
                .update_camera_protection(surface.handle, camera_protection);
            surface.camera_protection = camera_protection;
        }
        surface
    }

    fn reconcile_hardware(&mut self) {
        if !any_needed(&self.requirements) {
            self.release_hardware();
            return;
        }
        let providers: Vec<DecorProvider> = self
            .requirements
            .iter()
            .flat_map(|r| r.attached.iter().cloned())
            .collect();

        let mut surface = match self.hardware.take() {
            Some(surface) => surface,
            None => {
                let handle = self.platform.create_surface(SurfaceTarget::Hardware);
                self.platform.set_visibility(handle, true);
                tracing::debug!(?handle, "hardware surface created");
                HardwareSurface {
                    handle,
                    providers: Vec::new(),
                    camera_protection: None,
                }
            }
        };
        if surface.providers != providers {
            self.platform.update_content(surface.handle, &providers);
            surface.providers = providers;
        }
        if surface.camera_protection != self.camera_protection {
            self.platform
                .update_camera_protection(surface.handle, self.camera_protection);
            surface.camera_protection = self.camera_protection;
        }
        self.hardware = Some(surface);
    }

    fn release_edges(&mut self) {
        for slot in &mut self.edges {
            if let Some(surface) = slot.take() {
                self.platform.destroy_surface(surface.handle);
            }
        }
    }

    fn release_hardware(&mut self) {
        if let Some(surface) = self.hardware.take() {
            self.platform.destroy_surface(surface.handle);
            tracing::debug!(handle = ?surface.handle, "hardware surface destroyed");
        }
    }

    fn sync_registration(&mut self) {
        let wanted = self.edges.iter().any(Option::is_some) || self.hardware.is_some();
        match (wanted, self.registration.tuning_registered) {
            (true, false) => {
                self.platform.add_tunable(ROUNDED_SIZE_KEY);
                self.registration.tuning_registered = true;
                tracing::debug!("tunable subscribed");
            }
            (false, true) => {
                self.platform.remove_tunable(ROUNDED_SIZE_KEY);
                self.registration.tuning_registered = false;
                tracing::debug!("tunable unsubscribed");
            }
            _ => {}
        }
    }

    /// Index of the live edge surface hosting `view`.
    fn edge_hosting(&self, view: ViewId) -> Option<usize> {
        self.edges.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|s| s.providers.iter().any(|p| p.view_id() == view))
        })
    }

    fn set_indicator(&mut self, view: Option<ViewId>, shown: bool) {
        let Some(view) = view else {
            tracing::debug!(shown, "indicator signal without view");
            return;
        };
        let Some(i) = self.edge_hosting(view) else {
            tracing::debug!(?view, shown, "indicator signal for unhosted view");
            return;
        };
        let Some(surface) = self.edges[i].as_mut() else {
            return;
        };
        let flipped = if shown {
            surface.visibility.show(view)
        } else {
            surface.visibility.hide(view)
        };
        if flipped {
            self.platform
                .set_visibility(surface.handle, surface.visibility.is_visible());
        }
    }
}

impl<P: Platform> IndicatorListener for Orchestrator<P> {
    fn on_indicator_shown(&mut self, view: Option<ViewId>) {
        self.set_indicator(view, true);
    }

    fn on_indicator_hidden(&mut self, view: Option<ViewId>) {
        self.set_indicator(view, false);
    }
}

fn face_scanning_view(providers: &[DecorProvider]) -> Option<ViewId> {
    providers
        .iter()
        .find(|p| p.kind() == ProviderKind::FaceScanning)
        .map(DecorProvider::view_id)
}

/// Camera protection wanted on a surface hosting `providers`. While
/// protection is active the face-scanning indicator counts as shown.
fn align_face_scanning(
    visibility: &mut EdgeVisibility,
    providers: &[DecorProvider],
    protection: Option<Rect>,
) -> Option<Rect> {
    let face = face_scanning_view(providers)?;
    if protection.is_some() {
        visibility.show(face);
    }
    protection
}
