//! Client role: sign and send calls to a remote clipgate server.

use crate::error::{ClientError, RpcError};
use crate::proto::rpc_call::Call;
use crate::proto::rpc_reply::Outcome;
use crate::proto::{CopyArgs, OpenArgs, PasteArgs, RpcCall, RpcReply};
use crate::service::LineEnding;
use crate::transport::{FrameSigner, websocket_config};

use common::ErrorLocation;

use std::fmt::Display;
use std::panic::Location;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::debug;
use prost::Message as ProstMessage;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async_with_config};

type ClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One connection to a server. Calls are sent one at a time.
pub struct RemoteClient {
    write: SplitSink<ClientStream, Message>,
    read: SplitStream<ClientStream>,
    signer: Option<FrameSigner>,
    next_seq: u64,
}

impl RemoteClient {
    /// Connect to `address` (`host:port`). Frames are signed when a signer
    /// is given, sent plain otherwise.
    pub async fn connect(
        address: impl Display,
        signer: Option<FrameSigner>,
    ) -> Result<Self, ClientError> {
        let url = format!("ws://{address}/");

        let (ws_stream, _response) = connect_async_with_config(url.as_str(), Some(websocket_config()), true)
            .await
            .map_err(|e| ClientError::Connect {
                url: url.clone(),
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!("Connected to {url}");
        let (write, read) = ws_stream.split();

        Ok(Self {
            write,
            read,
            signer,
            next_seq: 1,
        })
    }

    pub async fn copy(
        &mut self,
        text: impl Into<String>,
        line_ending: Option<LineEnding>,
    ) -> Result<(), ClientError> {
        self.call(Call::Copy(CopyArgs::new(text, line_ending)))
            .await
            .map(|_| ())
    }

    pub async fn paste(&mut self) -> Result<String, ClientError> {
        let reply = self.call(Call::Paste(PasteArgs {})).await?;
        match reply.outcome {
            Some(Outcome::Paste(paste)) => Ok(paste.text),
            other => Err(ClientError::UnexpectedReply {
                message: format!("paste answered with {other:?}"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    pub async fn open(
        &mut self,
        uri: impl Into<String>,
        translate_loopback: bool,
    ) -> Result<(), ClientError> {
        self.call(Call::Open(OpenArgs {
            uri: uri.into(),
            translate_loopback,
        }))
        .await
        .map(|_| ())
    }

    /// Send one call and wait for its reply.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Closed`] when the server hangs up instead of replying,
    ///   which is what an authentication failure looks like
    /// - [`ClientError::Remote`] when the server reports the call failed
    pub async fn call(&mut self, call: Call) -> Result<RpcReply, ClientError> {
        let seq = self.next_seq;
        self.next_seq += 1;

        let request = RpcCall {
            seq,
            call: Some(call),
        };

        let mut payload = Vec::new();
        request.encode(&mut payload).map_err(RpcError::from)?;

        let frame = match &self.signer {
            Some(signer) => signer.seal(&payload),
            None => payload,
        };

        self.write
            .send(Message::Binary(frame.into()))
            .await
            .map_err(|e| ClientError::Send {
                message: format!("Failed to send call {seq}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let reply = self.receive_reply().await?;

        if reply.seq != seq {
            return Err(ClientError::UnexpectedReply {
                message: format!("expected reply {seq}, got {}", reply.seq),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if let Some(message) = reply.error {
            return Err(ClientError::Remote {
                message,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(reply)
    }

    async fn receive_reply(&mut self) -> Result<RpcReply, ClientError> {
        loop {
            match self.read.next().await {
                None | Some(Ok(Message::Close(_))) => return Err(ClientError::closed()),
                Some(Ok(Message::Binary(data))) => {
                    return RpcReply::decode(&data[..])
                        .map_err(|e| ClientError::from(RpcError::from(e)));
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(Message::Text(_))) => {
                    return Err(ClientError::UnexpectedReply {
                        message: String::from("server sent a text message"),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
                Some(Err(e)) => {
                    return Err(ClientError::Receive {
                        message: e.to_string(),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            }
        }
    }

    /// Close the connection politely.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.write.close().await.map_err(|e| ClientError::Send {
            message: format!("Failed to close connection: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
