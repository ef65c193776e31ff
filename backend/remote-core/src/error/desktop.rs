use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Failures of the local desktop primitives behind a call.
///
/// These are per-call errors: they travel back to the caller in the reply and
/// the session keeps serving.
#[derive(Debug, ThisError)]
pub enum DesktopError {
    #[error("Clipboard Error: {message} {location}")]
    Clipboard {
        message: String,
        location: ErrorLocation,
    },

    #[error("Open URI Error: '{uri}': {message} {location}")]
    OpenUri {
        uri: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Session Locked Error: desktop session is locked {location}")]
    SessionLocked { location: ErrorLocation },

    /// The blocking task running a desktop primitive did not complete.
    #[error("Desktop Task Error: {message} {location}")]
    Task {
        message: String,
        location: ErrorLocation,
    },
}

impl DesktopError {
    #[track_caller]
    pub fn clipboard(message: impl Into<String>) -> Self {
        DesktopError::Clipboard {
            message: message.into(),
            location: ErrorLocation::caller(),
        }
    }

    #[track_caller]
    pub fn open_uri(uri: impl Into<String>, message: impl Into<String>) -> Self {
        DesktopError::OpenUri {
            uri: uri.into(),
            message: message.into(),
            location: ErrorLocation::caller(),
        }
    }

    #[track_caller]
    pub fn session_locked() -> Self {
        DesktopError::SessionLocked {
            location: ErrorLocation::caller(),
        }
    }

    #[track_caller]
    pub fn task(message: impl Into<String>) -> Self {
        DesktopError::Task {
            message: message.into(),
            location: ErrorLocation::caller(),
        }
    }
}

impl DesktopError {
    /// Message sent back to the remote caller. Source locations stay local.
    pub fn caller_message(&self) -> String {
        match self {
            DesktopError::Clipboard { message, .. } => format!("clipboard: {message}"),
            DesktopError::OpenUri { uri, message, .. } => format!("open '{uri}': {message}"),
            DesktopError::SessionLocked { .. } => String::from("desktop session is locked"),
            DesktopError::Task { .. } => String::from("desktop task failed"),
        }
    }
}
