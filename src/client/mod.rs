//! CLI client for engine queries.
//!
//! One-shot commands that connect to a running engine, perform a single
//! read-only request, print the result, and exit.

mod engine_client;
pub mod format;

use std::path::PathBuf;

use crate::cli::ClientAction;
use crate::engine;
use engine_client::EngineClient;

/// Client error type.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("engine: {0}")]
    Engine(String),
    #[error(transparent)]
    Socket(#[from] engine::EngineError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the client command.
///
/// Connects to the engine, performs the requested action, prints the
/// result, and returns. Called from `main.rs` for `Command::Client`.
pub async fn run(socket: Option<PathBuf>, action: ClientAction) -> Result<(), ClientError> {
    let socket_path = match socket {
        Some(path) => path,
        None => engine::default_socket_path()?,
    };
    let mut engine = EngineClient::connect(&socket_path).await?;

    match action {
        ClientAction::Snapshot => {
            let snapshot = engine.snapshot().await?;
            format::print_snapshot(&snapshot);
        }
        ClientAction::SameProviders { views } => {
            let same = engine.has_same_providers(views).await?;
            format::print_same_providers(same);
        }
    }

    Ok(())
}
