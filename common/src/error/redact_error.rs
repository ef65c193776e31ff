use crate::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RedactError {
    #[error("Serialization Error: {message} {location}")]
    Serialization {
        message: String,
        location: ErrorLocation,
    },

    #[error("Length Error: expected {expected} bytes, got {actual} {location}")]
    Length {
        expected: usize,
        actual: usize,
        location: ErrorLocation,
    },
}
