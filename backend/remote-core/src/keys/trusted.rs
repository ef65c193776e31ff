use crate::error::KeyError;
use crate::keys::{
    FilePolicy, KeyRef, PUBLIC_KEY_LENGTH, TRUSTED_FILE_NAME, check_key_file, ensure_key_dir,
};

use common::ErrorLocation;

use std::collections::HashMap;
use std::panic::Location;
use std::path::Path;

use ed25519_dalek::VerifyingKey;
use log::{info, warn};

const COMMENT_PREFIX: char = '#';
const LOGGED_PREFIX_CHARS: usize = 8;

/// Public keys allowed to sign calls, indexed by their [`KeyRef`].
///
/// Read once at service start and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct TrustedKeys {
    keys: HashMap<KeyRef, VerifyingKey>,
}

impl TrustedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key. Returns `false` if it was already present.
    pub fn insert(&mut self, key: VerifyingKey) -> bool {
        self.keys.insert(KeyRef::of(&key), key).is_none()
    }

    pub fn get(&self, key_ref: &KeyRef) -> Option<&VerifyingKey> {
        self.keys.get(key_ref)
    }

    pub fn contains(&self, key_ref: &KeyRef) -> bool {
        self.keys.contains_key(key_ref)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Parse the contents of a trusted-keys file.
    ///
    /// Lines that are blank or start with `#` are ignored. Lines that do not
    /// hold a valid hex encoded Ed25519 public key are logged and skipped, as
    /// are duplicates. Only a short prefix of a rejected line is ever logged.
    pub fn parse(contents: &str, source: &Path) -> Self {
        let mut trusted = Self::new();
        let normalized = contents.replace('\r', "\n");

        for line in normalized.split('\n').map(str::trim) {
            if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
                continue;
            }

            let prefix: String = line.chars().take(LOGGED_PREFIX_CHARS).collect();

            if line.len() != PUBLIC_KEY_LENGTH * 2 {
                warn!(
                    "Wrong size for key {prefix}... in {}, ignoring",
                    source.display()
                );
                continue;
            }

            let mut bytes = [0u8; PUBLIC_KEY_LENGTH];
            if let Err(e) = hex::decode_to_slice(line, &mut bytes) {
                warn!(
                    "Unable to decode key {prefix}... in {}: {e}, ignoring",
                    source.display()
                );
                continue;
            }

            let key = match VerifyingKey::from_bytes(&bytes) {
                Ok(key) => key,
                Err(e) => {
                    warn!(
                        "Key {prefix}... in {} is not an Ed25519 public key: {e}, ignoring",
                        source.display()
                    );
                    continue;
                }
            };

            if !trusted.insert(key) {
                warn!("Duplicate key {prefix}... in {}, ignoring", source.display());
            }
        }

        trusted
    }
}

/// Load `<dir>/trusted`.
///
/// # Errors
///
/// - [`KeyError::NotConfigured`] when `dir` does not exist (recoverable)
/// - [`KeyError::NotADirectory`] when `dir` is something else
/// - [`KeyError::Permissions`] when the file is accessible to group or others,
///   whatever its contents
/// - [`KeyError::Read`] / [`KeyError::NotARegularFile`] for unreadable files
pub fn load_trusted_set(dir: &Path) -> Result<TrustedKeys, KeyError> {
    ensure_key_dir(dir)?;

    let path = dir.join(TRUSTED_FILE_NAME);
    check_key_file(&path, FilePolicy::OwnerOnly)?;

    let contents = std::fs::read(&path).map_err(|e| KeyError::Read {
        path: path.clone(),
        source: e,
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Lines with invalid UTF-8 fail the key checks and are skipped
    let trusted = TrustedKeys::parse(&String::from_utf8_lossy(&contents), &path);
    info!(
        "Loaded {} trusted key(s) from {}",
        trusted.len(),
        path.display()
    );

    Ok(trusted)
}
