//! Output formatting for CLI commands.
//!
//! Human-readable tables and status lines on stdout. Shared by the
//! engine client and `decord simulate`.

use crate::decor::provider::ViewId;
use crate::ipc::protocol::{EdgeDescriptor, SnapshotDescriptor};
use crate::platform::{PlatformCommand, SurfaceTarget};

/// Print an engine snapshot: a status header, then one row per edge.
pub fn print_snapshot(snapshot: &SnapshotDescriptor) {
    println!(
        "State:     {}",
        if snapshot.started { "started" } else { "not started" }
    );
    println!("Mode:      {:?}", snapshot.mode);
    println!("Rotation:  {}", snapshot.rotation.degrees());
    println!(
        "Tuning:    {}",
        if snapshot.tuning_registered {
            "registered"
        } else {
            "-"
        }
    );
    if let Some(handle) = snapshot.hardware {
        println!("Hardware:  surface #{}", handle.0);
    }
    println!();
    println!("{:<8} {:<7} {:<8} {:<9} VIEWS", "EDGE", "NEEDED", "SURFACE", "VISIBLE");
    println!("{}", "-".repeat(70));
    for edge in &snapshot.edges {
        print_edge_row(edge);
    }
}

/// Print the answer to a provider comparison.
pub fn print_same_providers(same: bool) {
    if same {
        println!("Providers match the live surfaces");
    } else {
        println!("Providers differ from the live surfaces");
    }
}

/// Print platform commands in issue order.
pub fn print_commands(commands: &[PlatformCommand]) {
    if commands.is_empty() {
        println!("No platform commands");
        return;
    }
    for (i, command) in commands.iter().enumerate() {
        println!("{:>3}. {}", i + 1, describe_command(command));
    }
}

fn print_edge_row(edge: &EdgeDescriptor) {
    let surface = edge
        .surface
        .map(|h| format!("#{}", h.0))
        .unwrap_or_else(|| "-".into());
    let visible = match (edge.surface, edge.visible) {
        (None, _) => "-",
        (Some(_), true) => "yes",
        (Some(_), false) => "no",
    };
    println!(
        "{:<8} {:<7} {:<8} {:<9} {}",
        edge.edge.to_string(),
        if edge.needed { "yes" } else { "no" },
        surface,
        visible,
        format_views(&edge.views),
    );
}

/// One-line description of a platform command.
pub fn describe_command(command: &PlatformCommand) -> String {
    match command {
        PlatformCommand::CreateSurface { handle, target } => {
            format!("create #{} on {}", handle.0, format_target(*target))
        }
        PlatformCommand::DestroySurface { handle } => format!("destroy #{}", handle.0),
        PlatformCommand::SetVisibility { handle, visible } => {
            format!(
                "{} #{}",
                if *visible { "show" } else { "hide" },
                handle.0
            )
        }
        PlatformCommand::UpdateContent { handle, providers } => {
            let views: Vec<ViewId> = providers.iter().map(|p| p.view_id()).collect();
            format!("content #{} [{}]", handle.0, format_views(&views))
        }
        PlatformCommand::UpdateCameraProtection { handle, bounds } => match bounds {
            Some(r) => format!(
                "protect #{} ({}, {}, {}, {})",
                handle.0, r.left, r.top, r.right, r.bottom
            ),
            None => format!("unprotect #{}", handle.0),
        },
        PlatformCommand::AddTunable { key } => format!("subscribe {key}"),
        PlatformCommand::RemoveTunable { key } => format!("unsubscribe {key}"),
    }
}

fn format_target(target: SurfaceTarget) -> String {
    match target {
        SurfaceTarget::Edge { edge } => format!("{edge} edge"),
        SurfaceTarget::Hardware => "hardware layer".into(),
    }
}

fn format_views(views: &[ViewId]) -> String {
    if views.is_empty() {
        return "-".into();
    }
    views
        .iter()
        .map(ViewId::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
