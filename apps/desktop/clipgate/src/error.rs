use common::ErrorLocation;

use remote_core::error::{ClientError, ConfigError, KeyError, ServiceError};

use std::panic::Location;

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the host application.
///
/// Core errors are flattened to their message so the whole enum stays
/// serialisable for a front end; the location of the conversion is kept.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum AppError {
    /// Error from this App
    #[error("Clipgate Error: {message} {location}")]
    Clipgate {
        message: String,
        location: ErrorLocation,
    },

    /// Error from remote-core (config, keys, service, client)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// Start requested while the service is still running
    #[error("Already Running Error: {message} {location}")]
    AlreadyRunning {
        message: String,
        location: ErrorLocation,
    },

    /// Stop requested but nothing is running
    #[error("Not Running Error: {message} {location}")]
    NotRunning {
        message: String,
        location: ErrorLocation,
    },
}

impl AppError {
    #[track_caller]
    pub fn clipgate(message: impl Into<String>) -> Self {
        AppError::Clipgate {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    fn core(message: String) -> Self {
        AppError::Core {
            message,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ServiceError> for AppError {
    #[track_caller]
    fn from(error: ServiceError) -> Self {
        AppError::core(error.to_string())
    }
}

impl From<ConfigError> for AppError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        AppError::core(error.to_string())
    }
}

impl From<KeyError> for AppError {
    #[track_caller]
    fn from(error: KeyError) -> Self {
        AppError::core(error.to_string())
    }
}

impl From<ClientError> for AppError {
    #[track_caller]
    fn from(error: ClientError) -> Self {
        AppError::core(error.to_string())
    }
}
