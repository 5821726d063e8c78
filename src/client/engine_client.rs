//! Engine client for the CLI client.
//!
//! Speaks the client role: read-only queries, one request at a time.

use std::path::Path;

use futures::{SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio_util::codec::Framed;

use crate::decor::provider::ViewId;
use crate::ipc::codec::MessageCodec;
use crate::ipc::protocol::{Message, PROTOCOL_VERSION, Role, SnapshotDescriptor, Status};

use super::ClientError;

/// A handshaken connection to the engine.
pub struct EngineClient {
    framed: Framed<UnixStream, MessageCodec>,
    next_id: u32,
}

impl EngineClient {
    /// Connect to the engine at `socket_path` and introduce ourselves
    /// as a client.
    pub async fn connect(socket_path: &Path) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(socket_path).await.map_err(|e| {
            ClientError::Engine(format!("cannot reach {}: {e}", socket_path.display()))
        })?;
        let mut client = Self {
            framed: Framed::new(stream, MessageCodec::new()),
            next_id: 0,
        };

        let hello = Message::Hello {
            id: client.take_id(),
            version: PROTOCOL_VERSION,
            role: Role::Client,
        };
        match client.exchange(hello, "hello").await? {
            Message::HelloAck {
                status: Status::Ok, ..
            } => Ok(client),
            Message::HelloAck { error, .. } => Err(ClientError::Engine(format!(
                "engine refused client: {}",
                error.unwrap_or_default()
            ))),
            other => Err(unexpected("hello", other)),
        }
    }

    /// Fetch the engine's current requirements and surfaces.
    pub async fn snapshot(&mut self) -> Result<SnapshotDescriptor, ClientError> {
        let id = self.take_id();
        match self.exchange(Message::GetSnapshot { id }, "get_snapshot").await? {
            Message::Response {
                status: Status::Ok,
                snapshot: Some(snapshot),
                ..
            } => Ok(snapshot),
            other => Err(unexpected("get_snapshot", other)),
        }
    }

    /// Ask whether `providers` match the views on live surfaces.
    pub async fn has_same_providers(&mut self, providers: Vec<ViewId>) -> Result<bool, ClientError> {
        let id = self.take_id();
        match self
            .exchange(Message::HasSameProviders { id, providers }, "has_same_providers")
            .await?
        {
            Message::Response {
                status: Status::Ok,
                same_providers: Some(same),
                ..
            } => Ok(same),
            other => Err(unexpected("has_same_providers", other)),
        }
    }

    fn take_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Send one message and wait for the answer. Error responses become
    /// [`ClientError::Engine`].
    async fn exchange(&mut self, msg: Message, op: &str) -> Result<Message, ClientError> {
        let failed = |what: String| ClientError::Engine(format!("{op}: {what}"));
        self.framed
            .send(msg)
            .await
            .map_err(|e| failed(format!("send: {e}")))?;
        let Some(reply) = self.framed.next().await else {
            return Err(failed("engine closed the connection".into()));
        };
        match reply.map_err(|e| failed(format!("receive: {e}")))? {
            Message::Response {
                status: Status::Error,
                error,
                ..
            } => Err(failed(error.unwrap_or_default())),
            reply => Ok(reply),
        }
    }
}

fn unexpected(op: &str, msg: Message) -> ClientError {
    ClientError::Engine(format!("unexpected {op} response: {msg:?}"))
}
