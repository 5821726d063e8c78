//! Decoration engine daemon.
//!
//! Listens on a Unix domain socket. One peer at a time holds the
//! platform role: it reports configuration, display and indicator
//! changes, and receives the surface commands the orchestrator issues.
//! Any number of clients may query the engine.
//!
//! Architecture: channel-based actor. A single engine loop owns all
//! mutable state ([`state::EngineState`]). Per-connection tasks forward
//! requests via mpsc channels; the loop drains them into a
//! [`queue::WorkQueue`] so queued configuration changes collapse before
//! a composition pass runs. Platform commands are routed back to the
//! platform connection via per-connection channels.

mod connection;
mod handler;
pub mod orchestrator;
pub mod queue;
pub mod state;

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

use connection::{DisconnectNotice, EngineCommand};
use queue::{Batch, WorkQueue};
use state::{ConnectionId, EngineState};

use crate::ipc::protocol::Message;
use crate::platform::PlatformCommand;

/// Engine startup/runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("$XDG_RUNTIME_DIR is not set")]
    NoRuntimeDir,
    #[error("engine already running at {0}")]
    AlreadyRunning(PathBuf),
    #[error("failed to create directory {path}: {source}")]
    MkdirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to bind socket {path}: {source}")]
    BindFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

type OutboundSenders = HashMap<ConnectionId, mpsc::UnboundedSender<Message>>;

/// Run the engine daemon until SIGTERM or SIGINT.
///
/// Binds `socket`, or `$XDG_RUNTIME_DIR/decord/engine.sock` when none
/// is given. The socket file is removed on exit.
///
/// # Errors
///
/// Returns `EngineError` if no socket path can be resolved, socket bind
/// fails, or another engine is already running.
pub async fn run(socket: Option<PathBuf>) -> Result<(), EngineError> {
    let socket_path = match socket {
        Some(path) => path,
        None => default_socket_path()?,
    };
    let listener = bind_socket(&socket_path).await?;

    tracing::info!(path = %socket_path.display(), "engine listening");

    // Graceful shutdown on SIGTERM or SIGINT.
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;
    let shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
        }
    };

    serve(listener, shutdown).await;

    if let Err(e) = std::fs::remove_file(&socket_path) {
        tracing::warn!(error = %e, path = %socket_path.display(), "failed to remove socket");
    }

    tracing::info!("engine stopped");
    Ok(())
}

/// Accept and serve peers on `listener` until `shutdown` resolves.
///
/// On shutdown every surface is torn down and the resulting commands
/// are handed to the platform connection before its channel closes.
pub async fn serve(listener: UnixListener, shutdown: impl Future<Output = ()>) {
    // Channels for connection → engine communication.
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<EngineCommand>();
    let (disconnect_tx, mut disconnect_rx) = mpsc::unbounded_channel::<DisconnectNotice>();

    let mut outbound_senders: OutboundSenders = HashMap::new();
    let mut state = EngineState::new();
    let mut queue = WorkQueue::new();

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // -- New connection --
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        accept_connection(stream, &cmd_tx, &disconnect_tx, &mut outbound_senders);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                }
            }

            // -- Requests from connection tasks --
            Some(cmd) = cmd_rx.recv() => {
                queue.push(cmd);
                while let Ok(more) = cmd_rx.try_recv() {
                    queue.push(more);
                }
                while let Some(batch) = queue.pop() {
                    process_batch(&mut state, &outbound_senders, batch);
                }
            }

            // -- Connection disconnected --
            Some(notice) = disconnect_rx.recv() => {
                let conn_id = notice.connection_id;
                outbound_senders.remove(&conn_id);
                let role = state.connection_role(conn_id);
                state.remove_connection(conn_id);
                tracing::debug!(?conn_id, ?role, "connection cleaned up");
            }

            () = &mut shutdown => break,
        }
    }

    state.shutdown();
    if let Some((conn_id, commands)) = state.take_platform_commands() {
        dispatch_commands(&outbound_senders, conn_id, commands);
    }
}

/// Handle one queued request and answer every caller folded into it.
fn process_batch(
    state: &mut EngineState,
    outbound_senders: &OutboundSenders,
    batch: Batch<EngineCommand>,
) {
    let Batch { item, superseded } = batch;
    if !superseded.is_empty() {
        tracing::debug!(
            count = superseded.len(),
            conn_id = ?item.connection_id,
            "coalesced configuration changes"
        );
    }

    let response = handler::handle_message(state, item.request, item.connection_id);

    // Commands go out before the response that caused them.
    if let Some((conn_id, commands)) = state.take_platform_commands() {
        dispatch_commands(outbound_senders, conn_id, commands);
    }

    for earlier in superseded {
        let restamped = handler::restamp(&response, earlier.request.id());
        let _ = earlier.response_tx.send(restamped);
    }
    let _ = item.response_tx.send(response);
}

/// Accept a new connection, create channels and spawn handler task.
fn accept_connection(
    stream: UnixStream,
    cmd_tx: &mpsc::UnboundedSender<EngineCommand>,
    disconnect_tx: &mpsc::UnboundedSender<DisconnectNotice>,
    outbound_senders: &mut OutboundSenders,
) {
    let conn_id = ConnectionId::new();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    outbound_senders.insert(conn_id, outbound_tx);

    connection::spawn_connection(
        stream,
        conn_id,
        cmd_tx.clone(),
        outbound_rx,
        disconnect_tx.clone(),
    );

    tracing::debug!(?conn_id, "accepted connection");
}

/// Route platform commands to the platform connection task.
fn dispatch_commands(
    outbound_senders: &OutboundSenders,
    target: ConnectionId,
    commands: Vec<PlatformCommand>,
) {
    let Some(tx) = outbound_senders.get(&target) else {
        tracing::warn!(conn_id = ?target, "platform connection not found");
        return;
    };
    tracing::trace!(conn_id = ?target, count = commands.len(), "dispatching platform commands");
    for command in commands {
        if tx.send(Message::Command { id: 0, command }).is_err() {
            tracing::warn!(conn_id = ?target, "command send failed, platform disconnected");
            return;
        }
    }
}

// -- Socket setup --

/// Resolve the default engine socket path from `$XDG_RUNTIME_DIR`.
pub fn default_socket_path() -> Result<PathBuf, EngineError> {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").map_err(|_| EngineError::NoRuntimeDir)?;
    Ok(PathBuf::from(runtime_dir)
        .join("decord")
        .join("engine.sock"))
}

/// Bind the listener, creating a private parent directory first.
///
/// An address already in use is probed: if something answers, another
/// engine owns it; otherwise the leftover socket file is replaced.
async fn bind_socket(path: &Path) -> Result<UnixListener, EngineError> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        prepare_socket_dir(dir)?;
    }
    let bind_failed = |source| EngineError::BindFailed {
        path: path.to_path_buf(),
        source,
    };

    let err = match UnixListener::bind(path) {
        Ok(listener) => return Ok(listener),
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => e,
        Err(e) => return Err(bind_failed(e)),
    };
    if UnixStream::connect(path).await.is_ok() {
        return Err(EngineError::AlreadyRunning(path.to_path_buf()));
    }
    tracing::info!(path = %path.display(), error = %err, "replacing stale socket");
    std::fs::remove_file(path).map_err(bind_failed)?;
    UnixListener::bind(path).map_err(bind_failed)
}

/// Create `dir` with owner-only access. An existing directory is left
/// as it is.
fn prepare_socket_dir(dir: &Path) -> Result<(), EngineError> {
    use std::os::unix::fs::PermissionsExt;

    if dir.exists() {
        return Ok(());
    }
    let mkdir_failed = |source| EngineError::MkdirFailed {
        path: dir.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(mkdir_failed)?;
    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)).map_err(mkdir_failed)
}
