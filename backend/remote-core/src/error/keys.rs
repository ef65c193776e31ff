//! Error types for the key directory: trusted set and local identity.
//!
//! `NotConfigured` is the only recoverable variant: it means the key directory
//! does not exist and the remote-control subsystem simply stays off.

use common::ErrorLocation;

use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum KeyError {
    #[error("Key Directory Not Configured: {path} {location}")]
    NotConfigured {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Key Directory Error: {path} exists and is not a directory {location}")]
    NotADirectory {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Key File Error: not a regular file {path} {location}")]
    NotARegularFile {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Key Permission Error: bad permissions {mode:o} for file {path} {location}")]
    Permissions {
        path: PathBuf,
        mode: u32,
        location: ErrorLocation,
    },

    #[error("Key Read Error: {path}: {source} {location}")]
    Read {
        path: PathBuf,
        #[source]
        source: IoError,
        location: ErrorLocation,
    },

    #[error("Key Write Error: {path}: {source} {location}")]
    Write {
        path: PathBuf,
        #[source]
        source: IoError,
        location: ErrorLocation,
    },

    #[error("Key Size Error: {path}: expected {expected} bytes, got {actual} {location}")]
    Size {
        path: PathBuf,
        expected: usize,
        actual: usize,
        location: ErrorLocation,
    },

    #[error("Invalid Key Error: {path}: {message} {location}")]
    Invalid {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
    },

    #[error("Home Directory Error: {message} {location}")]
    NoHome {
        message: String,
        location: ErrorLocation,
    },
}

impl KeyError {
    /// True when the key directory is simply absent.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, KeyError::NotConfigured { .. })
    }

    /// True for the permission violations that must be reported to the user.
    pub fn is_permission_violation(&self) -> bool {
        matches!(self, KeyError::Permissions { .. })
    }
}
