//! Engine state: connection roles and the orchestrator they drive.
//!
//! All methods are pure state transitions with no I/O. Error strings
//! are machine-readable reasons sent back on the wire.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ipc::protocol::Role;
use crate::platform::PlatformCommand;
use crate::platform::remote::RemotePlatform;

use super::orchestrator::Orchestrator;

/// Unique identifier for a peer connection.
///
/// Monotonically increasing counter. Used to route platform commands
/// to the platform connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Engine state owned exclusively by the engine loop.
pub struct EngineState {
    orchestrator: Orchestrator<RemotePlatform>,
    connections: HashMap<ConnectionId, Role>,
    platform_connection: Option<ConnectionId>,
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            orchestrator: Orchestrator::new(RemotePlatform::new()),
            connections: HashMap::new(),
            platform_connection: None,
        }
    }

    /// Register a handshaken connection. A role is granted once per
    /// connection.
    ///
    /// Returns `Err("already_handshaken")` if `id` already holds a role
    /// and `Err("platform_already_connected")` if another connection
    /// holds the platform role.
    pub fn add_connection(&mut self, id: ConnectionId, role: Role) -> Result<(), &'static str> {
        if self.connections.contains_key(&id) {
            return Err("already_handshaken");
        }
        if role == Role::Platform {
            if self.platform_connection.is_some() {
                return Err("platform_already_connected");
            }
            self.platform_connection = Some(id);
        }
        self.connections.insert(id, role);
        Ok(())
    }

    /// Remove a connection. Losing the platform tears decorations down;
    /// commands produced by the teardown have nowhere to go and are
    /// dropped.
    pub fn remove_connection(&mut self, id: ConnectionId) {
        self.connections.remove(&id);
        if self.platform_connection == Some(id) {
            self.platform_connection = None;
            self.orchestrator.reset();
            let dropped = self.orchestrator.platform_mut().drain();
            tracing::info!(
                ?id,
                dropped = dropped.len(),
                "platform disconnected, decorations reset"
            );
        }
    }

    pub fn connection_role(&self, id: ConnectionId) -> Option<Role> {
        self.connections.get(&id).copied()
    }

    pub fn is_platform(&self, id: ConnectionId) -> bool {
        self.platform_connection == Some(id)
    }

    pub fn orchestrator(&self) -> &Orchestrator<RemotePlatform> {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut Orchestrator<RemotePlatform> {
        &mut self.orchestrator
    }

    /// Drain pending platform commands with the connection they belong
    /// to. Commands issued with no platform connected are discarded.
    pub fn take_platform_commands(&mut self) -> Option<(ConnectionId, Vec<PlatformCommand>)> {
        let commands = self.orchestrator.platform_mut().drain();
        if commands.is_empty() {
            return None;
        }
        match self.platform_connection {
            Some(conn) => Some((conn, commands)),
            None => {
                tracing::debug!(
                    count = commands.len(),
                    "no platform connected, dropping commands"
                );
                None
            }
        }
    }

    /// Tear everything down before the engine exits.
    pub fn shutdown(&mut self) {
        self.orchestrator.shutdown();
    }
}
