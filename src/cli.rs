use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::decor::edge::{Edge, Rotation};
use crate::decor::provider::ViewId;

#[derive(Parser)]
#[command(name = "decord", about = "Screen decoration overlay engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the engine daemon
    Daemon {
        /// Socket path (default: $XDG_RUNTIME_DIR/decord/engine.sock)
        #[arg(long)]
        socket: Option<PathBuf>,
    },

    /// Query a running engine
    Client {
        /// Socket path (default: $XDG_RUNTIME_DIR/decord/engine.sock)
        #[arg(long)]
        socket: Option<PathBuf>,

        #[command(subcommand)]
        action: ClientAction,
    },

    /// Run one composition against an in-process display and print the
    /// platform commands it issues
    Simulate(SimulateArgs),
}

#[derive(Subcommand)]
pub enum ClientAction {
    /// Show requirements and live surfaces
    Snapshot,

    /// Compare view ids against the live surfaces
    SameProviders {
        /// View ids, e.g. privacy_dot:top_left or cutout_fill:top
        views: Vec<ViewId>,
    },
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Uniform corner radius in pixels
    #[arg(long, default_value_t = 0)]
    pub radius: u32,

    /// Top corner radius (falls back to --radius)
    #[arg(long, default_value_t = 0)]
    pub radius_top: u32,

    /// Bottom corner radius (falls back to --radius)
    #[arg(long, default_value_t = 0)]
    pub radius_bottom: u32,

    /// Content padding around rounded corners
    #[arg(long, default_value_t = 0)]
    pub padding: u32,

    /// Fill sensor cutouts
    #[arg(long)]
    pub fill_cutout: bool,

    /// Enable the privacy indicator
    #[arg(long)]
    pub privacy_dot: bool,

    /// Enable the face-scanning indicator
    #[arg(long)]
    pub face_scanning: bool,

    /// Physical edge carrying a cutout (repeatable)
    #[arg(long = "cutout")]
    pub cutouts: Vec<Edge>,

    /// Display rotation in degrees
    #[arg(long, default_value = "0", value_parser = parse_rotation)]
    pub rotation: Rotation,

    /// Natural display width
    #[arg(long, default_value_t = 1080)]
    pub width: u32,

    /// Natural display height
    #[arg(long, default_value_t = 2400)]
    pub height: u32,

    /// Report hardware decoration support
    #[arg(long)]
    pub hardware: bool,

    /// Rounded size tuning override
    #[arg(long)]
    pub rounded_size: Option<String>,

    /// Indicator to show after start (repeatable)
    #[arg(long = "show-indicator")]
    pub show_indicators: Vec<ViewId>,

    /// Show camera protection over the first cutout after start
    #[arg(long)]
    pub protect_camera: bool,
}

fn parse_rotation(value: &str) -> Result<Rotation, String> {
    let degrees: u16 = value
        .parse()
        .map_err(|_| format!("invalid rotation {value:?}"))?;
    Rotation::try_from(degrees)
}
