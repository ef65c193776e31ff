use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RpcError {
    #[error("Protobuf Decode Error: {message} {location}")]
    ProtobufDecode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Protobuf Encode Error: {message} {location}")]
    ProtobufEncode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Empty Call Error: call {seq} carries no operation {location}")]
    EmptyCall { seq: u64, location: ErrorLocation },
}

impl From<prost::DecodeError> for RpcError {
    #[track_caller]
    fn from(error: prost::DecodeError) -> Self {
        RpcError::ProtobufDecode {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<prost::EncodeError> for RpcError {
    #[track_caller]
    fn from(error: prost::EncodeError) -> Self {
        RpcError::ProtobufEncode {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
