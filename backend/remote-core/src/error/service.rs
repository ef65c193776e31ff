use crate::error::{AllowListError, ConfigError, KeyError};

use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ServiceError {
    #[error("Bind Error: unable to listen on '{address}': {message} {location}")]
    Bind {
        address: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Accept Error: server is unable to accept requests: {message} {location}")]
    Accept {
        message: String,
        location: ErrorLocation,
    },

    #[error("Handshake Error: {message} {location}")]
    Handshake {
        message: String,
        location: ErrorLocation,
    },

    #[error("Send Error: {message} {location}")]
    Send {
        message: String,
        location: ErrorLocation,
    },

    #[error("Read Error: {message} {location}")]
    Read {
        message: String,
        location: ErrorLocation,
    },

    #[error("IO Error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    AllowList(#[from] AllowListError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Keys(#[from] KeyError),
}

impl From<IoError> for ServiceError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        ServiceError::Io {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
