//! Key directory: the trusted set a server verifies against and the local
//! identity a client signs with.
//!
//! Layout of the directory (`~/.clipgate` unless configured otherwise):
//!
//! - `trusted`: hex encoded public keys, one per line, owner-only permissions
//! - `key.pub`: raw 32 byte public key of the local identity
//! - `key`: raw 64 byte private key (seed followed by public key), owner-only

pub mod identity;
pub mod permissions;
pub mod trusted;

pub use identity::{LocalKeyPair, generate_identity, load_identity};
pub use permissions::{FilePolicy, check_key_file};
pub use trusted::{TrustedKeys, load_trusted_set};

use crate::error::KeyError;

use common::ErrorLocation;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::io::ErrorKind;
use std::panic::Location;
use std::path::{Path, PathBuf};

use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};

pub const KEY_DIR_NAME: &str = ".clipgate";
pub const TRUSTED_FILE_NAME: &str = "trusted";
pub const PUBLIC_KEY_FILE_NAME: &str = "key.pub";
pub const PRIVATE_KEY_FILE_NAME: &str = "key";

pub const PUBLIC_KEY_LENGTH: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;
pub const PRIVATE_KEY_LENGTH: usize = ed25519_dalek::KEYPAIR_LENGTH;
pub const KEY_REF_LENGTH: usize = 32;

/// SHA-256 of a public key. The only key identifier that goes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyRef([u8; KEY_REF_LENGTH]);

impl KeyRef {
    pub fn of(key: &VerifyingKey) -> Self {
        Self(Sha256::digest(key.as_bytes()).into())
    }

    pub fn from_bytes(bytes: [u8; KEY_REF_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_REF_LENGTH] {
        &self.0
    }
}

impl Display for KeyRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", hex::encode(self.0))
    }
}

/// `<home>/.clipgate`
pub fn default_key_dir() -> Result<PathBuf, KeyError> {
    dirs::home_dir()
        .map(|home| home.join(KEY_DIR_NAME))
        .ok_or_else(|| KeyError::NoHome {
            message: String::from("unable to resolve the home directory"),
            location: ErrorLocation::from(Location::caller()),
        })
}

/// The key directory must exist and be a directory.
///
/// Absence is reported as [`KeyError::NotConfigured`], which callers treat as
/// "remote control is switched off" rather than a failure.
pub(crate) fn ensure_key_dir(dir: &Path) -> Result<(), KeyError> {
    match std::fs::metadata(dir) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(KeyError::NotADirectory {
            path: dir.to_path_buf(),
            location: ErrorLocation::from(Location::caller()),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(KeyError::NotConfigured {
            path: dir.to_path_buf(),
            location: ErrorLocation::from(Location::caller()),
        }),
        Err(e) => Err(KeyError::Read {
            path: dir.to_path_buf(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}
