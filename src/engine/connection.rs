//! Per-connection task: framed I/O, handshake, request pipelining.
//!
//! A peer's first frame must be `hello`; the engine loop decides whether
//! to admit it. After that, requests are forwarded as they arrive
//! without waiting for earlier answers, responses are written back in
//! request order, and platform commands from the engine are written as
//! they come. The engine loop hears about the disconnect either way.

use futures::future::{self, BoxFuture};
use futures::stream::FuturesOrdered;
use futures::{FutureExt, SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::Framed;

use crate::ipc::codec::{CodecError, Decoded, FrameCodec, decode_frame};
use crate::ipc::protocol::{Message, Status};

use super::handler::error_response;
use super::queue::Coalesce;
use super::state::ConnectionId;

/// Command sent from a connection task to the engine loop.
#[derive(Debug)]
pub struct EngineCommand {
    pub request: Message,
    pub response_tx: oneshot::Sender<Message>,
    pub connection_id: ConnectionId,
}

impl Coalesce for EngineCommand {
    /// Back-to-back configuration changes from one peer collapse into
    /// the last of them.
    fn supersedes(&self, earlier: &Self) -> bool {
        self.connection_id == earlier.connection_id
            && matches!(self.request, Message::ConfigurationChanged { .. })
            && matches!(earlier.request, Message::ConfigurationChanged { .. })
    }
}

/// Notification sent when a connection closes.
#[derive(Debug)]
pub struct DisconnectNotice {
    pub connection_id: ConnectionId,
}

#[derive(Debug, thiserror::Error)]
enum ConnectionError {
    #[error("peer closed before hello")]
    HandshakeEof,
    #[error("first message was not hello")]
    NotHello,
    #[error("undecodable frame: {0}")]
    MalformedFrame(#[from] rmp_serde::decode::Error),
    #[error("framing: {0}")]
    Codec(#[from] CodecError),
    #[error("engine loop gone")]
    EngineGone,
    #[error("engine dropped the response")]
    ResponseDropped,
}

type Conn = Framed<UnixStream, FrameCodec>;

/// A response still being produced by the engine loop.
type PendingResponse = BoxFuture<'static, Result<Message, ConnectionError>>;

/// Spawn the task serving one peer.
///
/// The task runs until the peer disconnects or breaks the protocol,
/// then reports a [`DisconnectNotice`] so the engine can forget it.
pub fn spawn_connection(
    stream: UnixStream,
    conn_id: ConnectionId,
    cmd_tx: mpsc::UnboundedSender<EngineCommand>,
    outbound_rx: mpsc::UnboundedReceiver<Message>,
    disconnect_tx: mpsc::UnboundedSender<DisconnectNotice>,
) {
    tokio::spawn(async move {
        let framed = Framed::new(stream, FrameCodec::new());
        if let Err(e) = serve_peer(framed, conn_id, &cmd_tx, outbound_rx).await {
            tracing::debug!(?conn_id, error = %e, "connection closed");
        }
        let _ = disconnect_tx.send(DisconnectNotice {
            connection_id: conn_id,
        });
    });
}

async fn serve_peer(
    mut framed: Conn,
    conn_id: ConnectionId,
    cmd_tx: &mpsc::UnboundedSender<EngineCommand>,
    mut outbound_rx: mpsc::UnboundedReceiver<Message>,
) -> Result<(), ConnectionError> {
    if !handshake(&mut framed, conn_id, cmd_tx).await? {
        return Ok(());
    }

    let mut pending: FuturesOrdered<PendingResponse> = FuturesOrdered::new();
    loop {
        tokio::select! {
            // Commands are queued by the engine before it answers the
            // request that produced them; draining them first keeps
            // them ahead of that response on the wire.
            biased;

            outbound = outbound_rx.recv() => {
                // No sender left: the engine is shutting down.
                let Some(msg) = outbound else { return Ok(()) };
                framed.send(msg).await?;
            }
            Some(response) = pending.next(), if !pending.is_empty() => {
                framed.send(response?).await?;
            }
            frame = framed.next() => {
                let Some(frame) = frame else { return Ok(()) };
                let next = match decode_frame(&frame?) {
                    Decoded::Message(msg) => submit(cmd_tx, msg, conn_id)?,
                    Decoded::UnknownType(envelope) => {
                        let response = error_response(envelope.id, "unknown_type");
                        future::ready(Ok(response)).boxed()
                    }
                    // No id to answer to.
                    Decoded::Malformed(e) => return Err(e.into()),
                };
                pending.push_back(next);
            }
        }
    }
}

/// Read the opening hello, let the engine judge it and relay the ack.
/// Returns whether the peer was admitted.
async fn handshake(
    framed: &mut Conn,
    conn_id: ConnectionId,
    cmd_tx: &mpsc::UnboundedSender<EngineCommand>,
) -> Result<bool, ConnectionError> {
    let Some(frame) = framed.next().await else {
        return Err(ConnectionError::HandshakeEof);
    };
    let hello = match decode_frame(&frame?) {
        Decoded::Message(hello @ Message::Hello { .. }) => hello,
        // Anything else first is a protocol violation; close unanswered.
        Decoded::Message(_) | Decoded::UnknownType(_) => return Err(ConnectionError::NotHello),
        Decoded::Malformed(e) => return Err(e.into()),
    };

    let ack = submit(cmd_tx, hello, conn_id)?.await?;
    let admitted = !is_rejection(&ack);
    framed.send(ack).await?;
    Ok(admitted)
}

/// Hand a request to the engine loop.
///
/// The request is enqueued immediately; the returned future resolves to
/// its response.
fn submit(
    cmd_tx: &mpsc::UnboundedSender<EngineCommand>,
    request: Message,
    connection_id: ConnectionId,
) -> Result<PendingResponse, ConnectionError> {
    let (response_tx, response_rx) = oneshot::channel();
    cmd_tx
        .send(EngineCommand {
            request,
            response_tx,
            connection_id,
        })
        .map_err(|_| ConnectionError::EngineGone)?;
    Ok(response_rx
        .map(|result| result.map_err(|_| ConnectionError::ResponseDropped))
        .boxed())
}

fn is_rejection(ack: &Message) -> bool {
    matches!(
        ack,
        Message::HelloAck {
            status: Status::Error,
            ..
        }
    )
}
