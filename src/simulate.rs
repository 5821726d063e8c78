//! Offline composition against an in-process display.
//!
//! Drives the orchestrator with a [`RecordingPlatform`] built from
//! command-line flags, then prints the platform commands each step
//! issued and the resulting snapshot. No engine or socket involved.

use crate::cli::SimulateArgs;
use crate::client::format;
use crate::decor::config::DecorConfig;
use crate::decor::edge::{CutoutBounds, Edge, Rect, Size};
use crate::decor::mode::{AlphaInterpretation, BufferFormat, DecorationSupport};
use crate::decor::provider::DecorProvider;
use crate::decor::rounded::ROUNDED_SIZE_KEY;
use crate::decor::visibility::IndicatorListener;
use crate::engine::orchestrator::Orchestrator;
use crate::ipc::protocol::SnapshotDescriptor;
use crate::platform::recording::{LiveSurface, RecordingPlatform};
use crate::platform::{DisplayInfo, PlatformCommand, SurfaceTarget};

/// What one simulated operation did.
#[derive(Debug)]
pub struct Step {
    pub label: String,
    pub commands: Vec<PlatformCommand>,
}

#[derive(Debug)]
pub struct Simulation {
    pub steps: Vec<Step>,
    pub snapshot: SnapshotDescriptor,
    /// Surfaces alive on the platform side after the last step.
    pub live: Vec<LiveSurface>,
}

/// Run the simulation and print it.
pub fn run(args: SimulateArgs) {
    let simulation = simulate(&args);
    for step in &simulation.steps {
        println!("== {} ==", step.label);
        format::print_commands(&step.commands);
        println!();
    }
    format::print_snapshot(&simulation.snapshot);
    println!();
    print_live(&simulation.live);
}

pub fn simulate(args: &SimulateArgs) -> Simulation {
    let display = display_info(args);
    let logical = display.cutout.to_logical(display.natural_size, display.rotation);
    let camera = Edge::ALL.into_iter().find_map(|e| logical.get(e));
    let mut orch = Orchestrator::new(RecordingPlatform::new(display));
    let mut steps = Vec::new();

    orch.on_configuration_changed(config(args));
    if let Some(value) = &args.rounded_size {
        orch.on_tuning_changed(ROUNDED_SIZE_KEY, Some(value));
    }
    orch.start();
    steps.push(take_step(&mut orch, "start".into()));

    for view in &args.show_indicators {
        orch.on_indicator_shown(Some(*view));
        steps.push(take_step(&mut orch, format!("show {view}")));
    }

    if args.protect_camera {
        match camera {
            Some(bounds) => {
                orch.show_camera_protection(bounds);
                steps.push(take_step(&mut orch, "camera protection".into()));
            }
            None => tracing::warn!("no cutout to protect, skipping camera protection"),
        }
    }

    Simulation {
        steps,
        snapshot: orch.requirement_snapshot(),
        live: orch.platform().live().values().cloned().collect(),
    }
}

fn print_live(live: &[LiveSurface]) {
    if live.is_empty() {
        println!("No live surfaces");
        return;
    }
    println!("{:<16} {:<8} {:<10} VIEWS", "SURFACE", "VISIBLE", "PROTECTED");
    println!("{}", "-".repeat(70));
    for surface in live {
        let target = match surface.target {
            SurfaceTarget::Edge { edge } => format!("{edge}"),
            SurfaceTarget::Hardware => "hardware".into(),
        };
        let views: Vec<String> = surface
            .providers
            .iter()
            .map(DecorProvider::view_id)
            .map(|v| v.to_string())
            .collect();
        println!(
            "{:<16} {:<8} {:<10} {}",
            target,
            if surface.visible { "yes" } else { "no" },
            if surface.camera_protection.is_some() { "yes" } else { "no" },
            if views.is_empty() { "-".into() } else { views.join(",") },
        );
    }
}

fn take_step(orch: &mut Orchestrator<RecordingPlatform>, label: String) -> Step {
    let commands = orch.platform().commands().to_vec();
    orch.platform_mut().clear_commands();
    Step { label, commands }
}

fn config(args: &SimulateArgs) -> DecorConfig {
    DecorConfig {
        radius: args.radius,
        radius_top: args.radius_top,
        radius_bottom: args.radius_bottom,
        padding: args.padding,
        fill_cutout: args.fill_cutout,
        privacy_dot: args.privacy_dot,
        face_scanning: args.face_scanning,
        ..DecorConfig::default()
    }
}

fn display_info(args: &SimulateArgs) -> DisplayInfo {
    let natural_size = Size::new(args.width, args.height);
    let mut cutout = CutoutBounds::none();
    for &edge in &args.cutouts {
        cutout.0[edge.index()] = Some(cutout_rect(edge, natural_size));
    }
    DisplayInfo {
        rotation: args.rotation,
        unique_id: "simulated".into(),
        decoration_support: args.hardware.then_some(DecorationSupport {
            format: BufferFormat::R8,
            alpha_interpretation: AlphaInterpretation::Coverage,
        }),
        natural_size,
        cutout,
    }
}

/// A camera-sized notch centered on `edge`, in the natural frame.
fn cutout_rect(edge: Edge, natural: Size) -> Rect {
    let w = natural.width as i32;
    let h = natural.height as i32;
    let depth = (w.min(h) / 12).max(1);
    let span = depth * 2;
    match edge {
        Edge::Top => Rect::new((w - span) / 2, 0, (w + span) / 2, depth),
        Edge::Bottom => Rect::new((w - span) / 2, h - depth, (w + span) / 2, h),
        Edge::Left => Rect::new(0, (h - span) / 2, depth, (h + span) / 2),
        Edge::Right => Rect::new(w - depth, (h - span) / 2, w, (h + span) / 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use crate::decor::edge::Rotation;
    use crate::decor::mode::DecorMode;
    use clap::Parser;

    fn args(flags: &[&str]) -> SimulateArgs {
        let argv = ["decord", "simulate"].iter().chain(flags).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Simulate(args) => args,
            _ => unreachable!(),
        }
    }

    fn created_targets(step: &Step) -> Vec<SurfaceTarget> {
        step.commands
            .iter()
            .filter_map(|c| match c {
                PlatformCommand::CreateSurface { target, .. } => Some(*target),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn nothing_configured_issues_nothing() {
        let sim = simulate(&args(&[]));
        assert_eq!(sim.steps.len(), 1);
        assert!(sim.steps[0].commands.is_empty());
        assert!(sim.snapshot.started);
        assert!(sim.snapshot.edges.iter().all(|e| !e.needed));
    }

    #[test]
    fn rounded_corners_on_top_and_bottom() {
        let sim = simulate(&args(&["--radius", "20"]));
        let targets = created_targets(&sim.steps[0]);
        assert_eq!(targets.len(), 2);
        assert!(targets.contains(&SurfaceTarget::Edge { edge: Edge::Top }));
        assert!(targets.contains(&SurfaceTarget::Edge { edge: Edge::Bottom }));
        assert!(sim.snapshot.tuning_registered);
    }

    #[test]
    fn side_cutout_moves_corners_to_sides() {
        let sim = simulate(&args(&["--radius", "20", "--fill-cutout", "--cutout", "left"]));
        let targets = created_targets(&sim.steps[0]);
        assert!(targets.contains(&SurfaceTarget::Edge { edge: Edge::Left }));
        assert!(targets.contains(&SurfaceTarget::Edge { edge: Edge::Right }));
        assert!(!targets.contains(&SurfaceTarget::Edge { edge: Edge::Top }));
    }

    #[test]
    fn hardware_uses_single_layer() {
        let sim = simulate(&args(&["--radius", "20", "--hardware"]));
        assert_eq!(
            created_targets(&sim.steps[0]),
            vec![SurfaceTarget::Hardware]
        );
        assert_eq!(sim.snapshot.mode, DecorMode::Hardware);
        assert!(sim.snapshot.hardware.is_some());
    }

    #[test]
    fn indicator_step_shows_surface() {
        let sim = simulate(&args(&[
            "--privacy-dot",
            "--show-indicator",
            "privacy_dot:bottom_left",
        ]));
        assert_eq!(sim.steps.len(), 2);
        assert!(matches!(
            sim.steps[1].commands.as_slice(),
            [PlatformCommand::SetVisibility { visible: true, .. }]
        ));
        assert!(sim.snapshot.edges[Edge::Bottom.index()].visible);
        assert!(!sim.snapshot.edges[Edge::Top.index()].visible);
    }

    #[test]
    fn camera_protection_reaches_face_scanning_edge() {
        let sim = simulate(&args(&[
            "--face-scanning",
            "--cutout",
            "top",
            "--protect-camera",
        ]));
        assert_eq!(sim.steps.len(), 2);
        let top = sim
            .live
            .iter()
            .find(|s| s.target == SurfaceTarget::Edge { edge: Edge::Top })
            .unwrap();
        assert!(top.visible);
        assert!(top.camera_protection.is_some());
    }

    #[test]
    fn camera_protection_uses_rotated_cutout() {
        let sim = simulate(&args(&[
            "--face-scanning",
            "--cutout",
            "top",
            "--rotation",
            "90",
            "--protect-camera",
        ]));
        let natural = Size::new(1080, 2400);
        let mut physical = CutoutBounds::none();
        physical.0[Edge::Top.index()] = Some(cutout_rect(Edge::Top, natural));
        let rotated = physical.to_logical(natural, Rotation::Deg90);
        let logical = Edge::ALL
            .into_iter()
            .find_map(|e| rotated.get(e))
            .unwrap();
        assert_ne!(Some(logical), physical.get(Edge::Top));

        let protected: Vec<Rect> = sim.live.iter().filter_map(|s| s.camera_protection).collect();
        assert_eq!(protected, vec![logical]);
    }

    #[test]
    fn camera_protection_without_cutout_is_skipped() {
        let sim = simulate(&args(&["--radius", "8", "--protect-camera"]));
        assert_eq!(sim.steps.len(), 1);
    }

    #[test]
    fn cutout_rects_sit_on_their_edge() {
        let natural = Size::new(1080, 2400);
        assert_eq!(cutout_rect(Edge::Top, natural).top, 0);
        assert_eq!(cutout_rect(Edge::Bottom, natural).bottom, 2400);
        assert_eq!(cutout_rect(Edge::Left, natural).left, 0);
        assert_eq!(cutout_rect(Edge::Right, natural).right, 1080);
    }
}
