use crate::error::{KeyError, RpcError};

use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ClientError {
    #[error("Connect Error: '{url}': {message} {location}")]
    Connect {
        url: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Send Error: {message} {location}")]
    Send {
        message: String,
        location: ErrorLocation,
    },

    #[error("Receive Error: {message} {location}")]
    Receive {
        message: String,
        location: ErrorLocation,
    },

    #[error("Connection Closed Error: server closed the connection without a reply {location}")]
    Closed { location: ErrorLocation },

    #[error("Remote Call Error: {message} {location}")]
    Remote {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unexpected Reply Error: {message} {location}")]
    UnexpectedReply {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Keys(#[from] KeyError),
}

impl ClientError {
    #[track_caller]
    pub fn closed() -> Self {
        ClientError::Closed {
            location: ErrorLocation::caller(),
        }
    }

    /// True when the server dropped the connection instead of answering,
    /// which is how authentication failures look from the client side.
    pub fn is_closed(&self) -> bool {
        matches!(self, ClientError::Closed { .. })
    }
}
