use crate::error::ServiceError;
use crate::proto::{RpcCall, RpcReply};
use crate::service::{CallerTicket, RemoteControl};
use crate::transport::{SessionTransport, websocket_config};

use common::ErrorLocation;

use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use prost::Message as ProstMessage;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async_with_config};
use uuid::Uuid;

type SessionSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type SessionSource = SplitStream<WebSocketStream<TcpStream>>;

/// Everything a session needs, shared by all sessions of one server.
pub(crate) struct SessionContext {
    pub(crate) control: RemoteControl,
    pub(crate) transport: SessionTransport,
    pub(crate) idle_timeout: Option<Duration>,
}

/// Why a session stopped reading.
enum SessionEnd {
    Disconnected,
    Idle,
    Rejected,
}

/// Serve one accepted connection until the peer leaves, goes idle or sends
/// something that ends the session.
///
/// Authentication and codec failures close the connection without a reply.
///
/// # Errors
///
/// - [`ServiceError::Handshake`] - WebSocket upgrade failed
/// - [`ServiceError::Read`] - the connection broke while reading
/// - [`ServiceError::Send`] / [`ServiceError::Io`] - a reply could not be written
pub(crate) async fn serve_session(
    stream: TcpStream,
    peer: SocketAddr,
    context: Arc<SessionContext>,
) -> Result<(), ServiceError> {
    let session_id = Uuid::new_v4();

    let ws_stream = accept_async_with_config(stream, Some(websocket_config()))
        .await
        .map_err(|e| ServiceError::Handshake {
            message: format!("WebSocket handshake with {peer} failed: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!("Session {session_id} opened for {peer}");

    let (mut write, mut read) = ws_stream.split();
    let ticket = CallerTicket::new(peer, session_id);

    let end = serve_calls(&mut write, &mut read, ticket, &context).await?;

    match end {
        SessionEnd::Disconnected => info!("Session {session_id} closed by {peer}"),
        SessionEnd::Idle => debug!("Session {session_id} with {peer} idle, closing"),
        SessionEnd::Rejected => info!("Session {session_id} with {peer} terminated"),
    }

    if let Err(e) = write.close().await {
        debug!("Session {session_id} close handshake with {peer} failed: {e}");
    }
    Ok(())
}

async fn serve_calls(
    write: &mut SessionSink,
    read: &mut SessionSource,
    ticket: CallerTicket,
    context: &SessionContext,
) -> Result<SessionEnd, ServiceError> {
    let peer = ticket.peer();
    let session_id = ticket.session_id();

    loop {
        let next = match context.idle_timeout {
            Some(limit) => match timeout(limit, read.next()).await {
                Ok(next) => next,
                Err(_) => return Ok(SessionEnd::Idle),
            },
            None => read.next().await,
        };

        let data = match next {
            None | Some(Ok(Message::Close(_))) => return Ok(SessionEnd::Disconnected),
            Some(Ok(Message::Binary(data))) => data,
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
            Some(Ok(Message::Text(_))) => {
                warn!("Session {session_id}: {peer} sent a text message");
                return Ok(SessionEnd::Rejected);
            }
            Some(Err(e)) => {
                return Err(ServiceError::Read {
                    message: format!("Error reading from {peer}: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        let payload = match context.transport.open_inbound(&data) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Session {session_id}: rejected frame from {peer}: {e}");
                return Ok(SessionEnd::Rejected);
            }
        };

        let call = match RpcCall::decode(&payload[..]) {
            Ok(call) => call,
            Err(e) => {
                warn!("Session {session_id}: undecodable call from {peer}: {e}");
                return Ok(SessionEnd::Rejected);
            }
        };

        let reply = match context.control.dispatch(call, ticket).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Session {session_id}: invalid call from {peer}: {e}");
                return Ok(SessionEnd::Rejected);
            }
        };

        send_reply(write, &reply).await?;
    }
}

/// Replies travel unsigned in both variants.
async fn send_reply(write: &mut SessionSink, reply: &RpcReply) -> Result<(), ServiceError> {
    let mut buf = Vec::new();
    reply.encode(&mut buf).map_err(|e| ServiceError::Send {
        message: format!("Failed to encode reply {}: {e}", reply.seq),
        location: ErrorLocation::from(Location::caller()),
    })?;

    write
        .send(Message::Binary(buf.into()))
        .await
        .map_err(|e| ServiceError::Send {
            message: format!("Failed to send reply {}: {e}", reply.seq),
            location: ErrorLocation::from(Location::caller()),
        })
}
