use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Per-frame authentication failures.
///
/// Every variant is a shutdown condition for the connection that sent the
/// frame: no reply is written, the socket is closed.
#[derive(Debug, ThisError)]
pub enum FrameError {
    #[error("Short Frame Error: {length} bytes, need more than {minimum} {location}")]
    ShortFrame {
        length: usize,
        minimum: usize,
        location: ErrorLocation,
    },

    #[error("Protocol Tag Error: server [{expected}], client [{actual}] {location}")]
    BadTag {
        expected: String,
        actual: String,
        location: ErrorLocation,
    },

    #[error("Unknown Key Error: call with unauthorized key {key_ref} {location}")]
    UnknownKey {
        key_ref: String,
        location: ErrorLocation,
    },

    #[error("Signature Error: call fails verification with key {key_ref} {location}")]
    BadSignature {
        key_ref: String,
        location: ErrorLocation,
    },
}

impl FrameError {
    /// Hex key reference named by the offending frame, when it got that far.
    pub fn key_ref(&self) -> Option<&str> {
        match self {
            FrameError::UnknownKey { key_ref, .. } | FrameError::BadSignature { key_ref, .. } => {
                Some(key_ref)
            }
            _ => None,
        }
    }
}
