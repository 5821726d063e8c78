//! Wire protocol message types for engine IPC.
//!
//! All messages are MessagePack-encoded maps with at minimum `type` and
//! `id` fields. Unsolicited engine → platform messages carry `id: 0`.

use serde::{Deserialize, Serialize};

use crate::decor::config::DecorConfig;
use crate::decor::edge::{Edge, Rect, Rotation};
use crate::decor::mode::DecorMode;
use crate::decor::provider::ViewId;
use crate::platform::{DisplayInfo, PlatformCommand, SurfaceHandle};

/// All wire protocol messages.
///
/// Serialized as a tagged union on the `type` field via MessagePack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Message {
    // -- Handshake --
    #[serde(rename = "hello")]
    Hello { id: u32, version: u32, role: Role },

    #[serde(rename = "hello_ack")]
    HelloAck {
        id: u32,
        status: Status,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    // -- Platform notifications --
    #[serde(rename = "start")]
    Start { id: u32 },

    #[serde(rename = "configuration_changed")]
    ConfigurationChanged { id: u32, config: DecorConfig },

    #[serde(rename = "display_changed")]
    DisplayChanged { id: u32, display: DisplayInfo },

    /// `view` may be absent; the engine treats that as a no-op.
    #[serde(rename = "indicator_shown")]
    IndicatorShown {
        id: u32,
        #[serde(default)]
        view: Option<ViewId>,
    },

    #[serde(rename = "indicator_hidden")]
    IndicatorHidden {
        id: u32,
        #[serde(default)]
        view: Option<ViewId>,
    },

    /// A tunable value changed. An absent `value` means the setting was
    /// cleared.
    #[serde(rename = "tuning_changed")]
    TuningChanged {
        id: u32,
        key: String,
        #[serde(default)]
        value: Option<String>,
    },

    #[serde(rename = "show_camera_protection")]
    ShowCameraProtection { id: u32, bounds: Rect },

    #[serde(rename = "hide_camera_protection")]
    HideCameraProtection { id: u32 },

    // -- Queries (any role) --
    #[serde(rename = "get_snapshot")]
    GetSnapshot { id: u32 },

    #[serde(rename = "has_same_providers")]
    HasSameProviders { id: u32, providers: Vec<ViewId> },

    // -- Unsolicited commands (engine → platform) --
    #[serde(rename = "platform_command")]
    Command { id: u32, command: PlatformCommand },

    // -- Generic response --
    #[serde(rename = "response")]
    Response {
        id: u32,
        status: Status,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        snapshot: Option<SnapshotDescriptor>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        same_providers: Option<bool>,
    },
}

impl Message {
    /// The request/response id every variant carries.
    pub fn id(&self) -> u32 {
        match self {
            Message::Hello { id, .. }
            | Message::HelloAck { id, .. }
            | Message::Start { id }
            | Message::ConfigurationChanged { id, .. }
            | Message::DisplayChanged { id, .. }
            | Message::IndicatorShown { id, .. }
            | Message::IndicatorHidden { id, .. }
            | Message::TuningChanged { id, .. }
            | Message::ShowCameraProtection { id, .. }
            | Message::HideCameraProtection { id }
            | Message::GetSnapshot { id }
            | Message::HasSameProviders { id, .. }
            | Message::Command { id, .. }
            | Message::Response { id, .. } => *id,
        }
    }
}

/// Peer role in the handshake.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The windowing/display service. At most one at a time.
    Platform,
    Client,
}

/// Response status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Engine state returned by `get_snapshot`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotDescriptor {
    pub started: bool,
    pub mode: DecorMode,
    pub rotation: Rotation,
    pub tuning_registered: bool,
    #[serde(default)]
    pub hardware: Option<SurfaceHandle>,
    pub edges: Vec<EdgeDescriptor>,
}

/// One edge in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EdgeDescriptor {
    pub edge: Edge,
    pub needed: bool,
    pub static_visible: bool,
    #[serde(default)]
    pub surface: Option<SurfaceHandle>,
    pub visible: bool,
    pub views: Vec<ViewId>,
}

/// Protocol version.
pub const PROTOCOL_VERSION: u32 = 1;

/// Maximum payload size (1 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Every `type` tag [`Message`] decodes.
pub const MESSAGE_TYPES: [&str; 14] = [
    "hello",
    "hello_ack",
    "start",
    "configuration_changed",
    "display_changed",
    "indicator_shown",
    "indicator_hidden",
    "tuning_changed",
    "show_camera_protection",
    "hide_camera_protection",
    "get_snapshot",
    "has_same_providers",
    "platform_command",
    "response",
];

/// Minimal envelope for extracting `{type, id}` from a frame that did
/// not decode as a [`Message`], so the error response can echo the
/// request `id`.
#[derive(Debug, Deserialize)]
pub struct RawEnvelope {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub id: u32,
}

impl RawEnvelope {
    /// Whether the tag names a [`Message`] variant. A known tag on a
    /// frame that failed to decode means the body is broken.
    pub fn is_known_type(&self) -> bool {
        MESSAGE_TYPES.contains(&self.msg_type.as_str())
    }
}
