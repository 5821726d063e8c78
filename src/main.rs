mod cli;
mod client;
mod decor;
mod engine;
mod ipc;
mod platform;
mod simulate;

use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Daemon { socket } => {
            if let Err(e) = engine::run(socket).await {
                tracing::error!(error = %e, "engine failed");
                eprintln!("decord daemon: {e}");
                std::process::exit(1);
            }
        }
        Command::Client { socket, action } => {
            if let Err(e) = client::run(socket, action).await {
                tracing::error!(error = %e, "client failed");
                eprintln!("decord client: {e}");
                std::process::exit(1);
            }
        }
        Command::Simulate(args) => simulate::run(args),
    }
}
