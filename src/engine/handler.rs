//! Message dispatch and request handling.
//!
//! Pure logic, no I/O. Each handler takes a mutable reference to
//! [`EngineState`] and returns the response message. Platform commands
//! produced along the way stay in the orchestrator's outbox until the
//! engine loop drains them.

use crate::decor::visibility::IndicatorListener;
use crate::ipc::protocol::{Message, PROTOCOL_VERSION, Role, SnapshotDescriptor, Status};

use super::state::{ConnectionId, EngineState};

/// Dispatch a request message to the appropriate handler.
///
/// Enforces:
/// - Role-based access: platform-only messages from other peers get
///   `not_platform`
/// - Engine-originated variants → `unknown_type`
pub fn handle_message(
    state: &mut EngineState,
    request: Message,
    connection_id: ConnectionId,
) -> Message {
    match request {
        // Roles are granted by the opening hello only.
        Message::Hello { id, .. } if state.connection_role(connection_id).is_some() => {
            error_response(id, "already_handshaken")
        }
        Message::Hello { id, version, role } => {
            handle_hello(state, id, version, role, connection_id)
        }
        // -- Platform-only messages --
        Message::Start { id } => platform_only(state, id, connection_id, |s| {
            s.orchestrator_mut().start();
        }),
        Message::ConfigurationChanged { id, config } => {
            platform_only(state, id, connection_id, |s| {
                s.orchestrator_mut().on_configuration_changed(config);
            })
        }
        Message::DisplayChanged { id, display } => platform_only(state, id, connection_id, |s| {
            let orch = s.orchestrator_mut();
            orch.platform_mut().set_display(display);
            orch.on_display_changed();
        }),
        Message::IndicatorShown { id, view } => platform_only(state, id, connection_id, |s| {
            s.orchestrator_mut().on_indicator_shown(view);
        }),
        Message::IndicatorHidden { id, view } => platform_only(state, id, connection_id, |s| {
            s.orchestrator_mut().on_indicator_hidden(view);
        }),
        Message::TuningChanged { id, key, value } => {
            platform_only(state, id, connection_id, |s| {
                s.orchestrator_mut()
                    .on_tuning_changed(&key, value.as_deref());
            })
        }
        Message::ShowCameraProtection { id, bounds } => {
            platform_only(state, id, connection_id, |s| {
                s.orchestrator_mut().show_camera_protection(bounds);
            })
        }
        Message::HideCameraProtection { id } => platform_only(state, id, connection_id, |s| {
            s.orchestrator_mut().hide_camera_protection();
        }),
        // -- Any role --
        Message::GetSnapshot { id } => {
            snapshot_response(id, state.orchestrator().requirement_snapshot())
        }
        Message::HasSameProviders { id, providers } => {
            let same = state.orchestrator().has_same_providers(&providers);
            Message::Response {
                id,
                status: Status::Ok,
                error: None,
                snapshot: None,
                same_providers: Some(same),
            }
        }
        // Engine-originated messages should never be sent by peers.
        Message::HelloAck { id, .. } | Message::Response { id, .. } | Message::Command { id, .. } => {
            error_response(id, "unknown_type")
        }
    }
}

/// Answer for a request whose work was folded into a later one: the
/// later response, re-addressed to `id`.
pub fn restamp(response: &Message, id: u32) -> Message {
    match response {
        Message::Response {
            status,
            error,
            snapshot,
            same_providers,
            ..
        } => Message::Response {
            id,
            status: *status,
            error: error.clone(),
            snapshot: snapshot.clone(),
            same_providers: *same_providers,
        },
        _ => ok_response(id),
    }
}

// -- Individual handlers --

fn handle_hello(
    state: &mut EngineState,
    id: u32,
    version: u32,
    role: Role,
    connection_id: ConnectionId,
) -> Message {
    // hello.id must be 0.
    if id != 0 {
        return hello_error("invalid_hello_id");
    }
    if version != PROTOCOL_VERSION {
        return hello_error("version_mismatch");
    }
    if let Err(reason) = state.add_connection(connection_id, role) {
        return hello_error(reason);
    }
    tracing::debug!(?connection_id, ?role, "handshake complete");
    // hello_ack.id is always 0.
    Message::HelloAck {
        id: 0,
        status: Status::Ok,
        error: None,
    }
}

fn platform_only(
    state: &mut EngineState,
    id: u32,
    connection_id: ConnectionId,
    apply: impl FnOnce(&mut EngineState),
) -> Message {
    if !state.is_platform(connection_id) {
        return error_response(id, "not_platform");
    }
    apply(state);
    ok_response(id)
}

// -- Helpers --

fn hello_error(reason: &str) -> Message {
    Message::HelloAck {
        id: 0,
        status: Status::Error,
        error: Some(reason.into()),
    }
}

fn snapshot_response(id: u32, snapshot: SnapshotDescriptor) -> Message {
    Message::Response {
        id,
        status: Status::Ok,
        error: None,
        snapshot: Some(snapshot),
        same_providers: None,
    }
}

fn ok_response(id: u32) -> Message {
    Message::Response {
        id,
        status: Status::Ok,
        error: None,
        snapshot: None,
        same_providers: None,
    }
}

pub fn error_response(id: u32, reason: &str) -> Message {
    Message::Response {
        id,
        status: Status::Error,
        error: Some(reason.into()),
        snapshot: None,
        same_providers: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decor::config::DecorConfig;
    use crate::decor::edge::{Edge, Size};
    use crate::decor::provider::{Corner, ViewId};
    use crate::platform::{DisplayInfo, PlatformCommand};

    fn fresh() -> (EngineState, ConnectionId) {
        (EngineState::new(), ConnectionId::new())
    }

    fn hello(version: u32, role: Role) -> Message {
        Message::Hello {
            id: 0,
            version,
            role,
        }
    }

    fn platform() -> (EngineState, ConnectionId) {
        let (mut s, c) = fresh();
        handle_message(&mut s, hello(PROTOCOL_VERSION, Role::Platform), c);
        (s, c)
    }

    fn display() -> DisplayInfo {
        DisplayInfo {
            unique_id: "d0".into(),
            natural_size: Size::new(100, 200),
            ..DisplayInfo::default()
        }
    }

    fn dots_config() -> DecorConfig {
        DecorConfig {
            privacy_dot: true,
            ..DecorConfig::default()
        }
    }

    fn assert_ok(resp: &Message) {
        assert!(
            matches!(
                resp,
                Message::Response {
                    status: Status::Ok,
                    ..
                }
            ),
            "expected ok, got {resp:?}"
        );
    }

    fn error_of(resp: Message) -> Option<String> {
        match resp {
            Message::Response { error, .. } | Message::HelloAck { error, .. } => error,
            other => panic!("expected response, got {other:?}"),
        }
    }

    // -- Hello --

    #[test]
    fn hello_success() {
        let (mut s, c) = fresh();
        let resp = handle_message(&mut s, hello(PROTOCOL_VERSION, Role::Client), c);
        assert!(matches!(
            resp,
            Message::HelloAck {
                id: 0,
                status: Status::Ok,
                ..
            }
        ));
        assert_eq!(s.connection_role(c), Some(Role::Client));
    }

    #[test]
    fn hello_version_mismatch() {
        let (mut s, c) = fresh();
        let resp = handle_message(&mut s, hello(999, Role::Platform), c);
        assert_eq!(error_of(resp).as_deref(), Some("version_mismatch"));
        assert!(!s.is_platform(c));
    }

    #[test]
    fn hello_nonzero_id_rejected() {
        let (mut s, c) = fresh();
        let resp = handle_message(
            &mut s,
            Message::Hello {
                id: 5,
                version: PROTOCOL_VERSION,
                role: Role::Client,
            },
            c,
        );
        match resp {
            Message::HelloAck { id, error, .. } => {
                assert_eq!(id, 0);
                assert_eq!(error.as_deref(), Some("invalid_hello_id"));
            }
            other => panic!("expected HelloAck, got {other:?}"),
        }
    }

    #[test]
    fn second_platform_rejected() {
        let (mut s, _) = platform();
        let other = ConnectionId::new();
        let resp = handle_message(&mut s, hello(PROTOCOL_VERSION, Role::Platform), other);
        assert_eq!(error_of(resp).as_deref(), Some("platform_already_connected"));
    }

    #[test]
    fn client_cannot_rehello_into_platform() {
        let (mut s, c) = fresh();
        handle_message(&mut s, hello(PROTOCOL_VERSION, Role::Client), c);
        let resp = handle_message(&mut s, hello(PROTOCOL_VERSION, Role::Platform), c);
        assert!(matches!(resp, Message::Response { status: Status::Error, .. }));
        assert_eq!(error_of(resp).as_deref(), Some("already_handshaken"));
        assert!(!s.is_platform(c));

        let resp = handle_message(&mut s, Message::Start { id: 1 }, c);
        assert_eq!(error_of(resp).as_deref(), Some("not_platform"));
        assert!(!s.orchestrator().is_started());
    }

    #[test]
    fn platform_rehello_keeps_its_role() {
        let (mut s, c) = platform();
        let resp = handle_message(&mut s, hello(PROTOCOL_VERSION, Role::Client), c);
        assert_eq!(error_of(resp).as_deref(), Some("already_handshaken"));
        assert_eq!(s.connection_role(c), Some(Role::Platform));
        assert!(s.is_platform(c));
        assert_ok(&handle_message(&mut s, Message::Start { id: 2 }, c));
    }

    // -- Platform messages --

    #[test]
    fn platform_messages_rejected_from_client() {
        let (mut s, c) = fresh();
        handle_message(&mut s, hello(PROTOCOL_VERSION, Role::Client), c);
        for msg in [
            Message::Start { id: 1 },
            Message::ConfigurationChanged {
                id: 2,
                config: dots_config(),
            },
            Message::IndicatorShown { id: 3, view: None },
            Message::HideCameraProtection { id: 4 },
        ] {
            let id = msg.id();
            let resp = handle_message(&mut s, msg, c);
            assert_eq!(resp.id(), id);
            assert_eq!(error_of(resp).as_deref(), Some("not_platform"));
        }
        assert!(!s.orchestrator().is_started());
    }

    #[test]
    fn start_flow_produces_surface_commands() {
        let (mut s, c) = platform();
        assert_ok(&handle_message(
            &mut s,
            Message::DisplayChanged {
                id: 1,
                display: display(),
            },
            c,
        ));
        assert_ok(&handle_message(
            &mut s,
            Message::ConfigurationChanged {
                id: 2,
                config: dots_config(),
            },
            c,
        ));
        assert!(s.take_platform_commands().is_none());

        assert_ok(&handle_message(&mut s, Message::Start { id: 3 }, c));
        let (target, commands) = s.take_platform_commands().unwrap();
        assert_eq!(target, c);
        let creates = commands
            .iter()
            .filter(|c| matches!(c, PlatformCommand::CreateSurface { .. }))
            .count();
        assert_eq!(creates, 2);
        assert!(
            commands
                .iter()
                .any(|c| matches!(c, PlatformCommand::AddTunable { .. }))
        );
    }

    #[test]
    fn indicator_messages_toggle_visibility() {
        let (mut s, c) = platform();
        handle_message(&mut s, Message::DisplayChanged { id: 1, display: display() }, c);
        handle_message(&mut s, Message::ConfigurationChanged { id: 2, config: dots_config() }, c);
        handle_message(&mut s, Message::Start { id: 3 }, c);
        s.take_platform_commands();

        let view = Some(ViewId::PrivacyDot {
            corner: Corner::TopLeft,
        });
        assert_ok(&handle_message(&mut s, Message::IndicatorShown { id: 4, view }, c));
        let (_, commands) = s.take_platform_commands().unwrap();
        assert!(matches!(
            commands.as_slice(),
            [PlatformCommand::SetVisibility { visible: true, .. }]
        ));

        // Absent view is a no-op, still answered ok.
        assert_ok(&handle_message(
            &mut s,
            Message::IndicatorHidden { id: 5, view: None },
            c,
        ));
        assert!(s.take_platform_commands().is_none());
    }

    // -- Queries --

    #[test]
    fn snapshot_from_client() {
        let (mut s, p) = platform();
        handle_message(&mut s, Message::DisplayChanged { id: 1, display: display() }, p);
        handle_message(&mut s, Message::ConfigurationChanged { id: 2, config: dots_config() }, p);
        handle_message(&mut s, Message::Start { id: 3 }, p);

        let client = ConnectionId::new();
        handle_message(&mut s, hello(PROTOCOL_VERSION, Role::Client), client);
        match handle_message(&mut s, Message::GetSnapshot { id: 9 }, client) {
            Message::Response {
                id,
                snapshot: Some(snapshot),
                ..
            } => {
                assert_eq!(id, 9);
                assert!(snapshot.started);
                assert!(snapshot.edges[Edge::Top.index()].needed);
                assert!(snapshot.edges[Edge::Bottom.index()].surface.is_some());
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn has_same_providers_query() {
        let (mut s, c) = fresh();
        match handle_message(
            &mut s,
            Message::HasSameProviders {
                id: 4,
                providers: vec![],
            },
            c,
        ) {
            Message::Response { same_providers, .. } => assert_eq!(same_providers, Some(true)),
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn engine_messages_return_unknown_type() {
        let (mut s, c) = platform();
        for msg in [
            Message::HelloAck {
                id: 1,
                status: Status::Ok,
                error: None,
            },
            ok_response(2),
            Message::Command {
                id: 3,
                command: PlatformCommand::AddTunable { key: "k".into() },
            },
        ] {
            let resp = handle_message(&mut s, msg, c);
            assert_eq!(error_of(resp).as_deref(), Some("unknown_type"));
        }
    }

    #[test]
    fn restamp_keeps_outcome() {
        let resp = error_response(7, "not_platform");
        let restamped = restamp(&resp, 3);
        assert_eq!(restamped.id(), 3);
        assert_eq!(error_of(restamped).as_deref(), Some("not_platform"));
    }
}
