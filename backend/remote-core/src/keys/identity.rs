use crate::error::KeyError;
use crate::keys::permissions::write_key_file;
use crate::keys::{
    FilePolicy, KeyRef, PRIVATE_KEY_FILE_NAME, PRIVATE_KEY_LENGTH, PUBLIC_KEY_FILE_NAME,
    PUBLIC_KEY_LENGTH, check_key_file, ensure_key_dir,
};

use common::{ErrorLocation, SecretBytes};

use std::fmt;
use std::fs;
use std::panic::Location;
use std::path::Path;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use log::info;
use rand_core::OsRng;

const KEY_DIR_MODE: u32 = 0o700;
const PUBLIC_KEY_MODE: u32 = 0o644;
const PRIVATE_KEY_MODE: u32 = 0o600;

/// The local signing identity used by the client role.
pub struct LocalKeyPair {
    signing_key: SigningKey,
}

impl LocalKeyPair {
    /// Fresh key pair from the OS random number generator.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn key_ref(&self) -> KeyRef {
        KeyRef::of(&self.public_key())
    }

    /// Hex form, one line of a server's `trusted` file.
    pub fn public_hex(&self) -> String {
        hex::encode(self.public_key().as_bytes())
    }

    /// Seed followed by public key.
    pub fn private_bytes(&self) -> SecretBytes<PRIVATE_KEY_LENGTH> {
        SecretBytes::new(self.signing_key.to_keypair_bytes())
    }

    pub fn sign(&self, payload: &[u8]) -> Signature {
        self.signing_key.sign(payload)
    }
}

impl fmt::Debug for LocalKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeyPair")
            .field("public_key", &self.public_hex())
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Create a new identity in `dir`, replacing any existing one.
///
/// The directory is created owner-only; `key.pub` is world readable, `key`
/// owner-only.
pub fn generate_identity(dir: &Path) -> Result<LocalKeyPair, KeyError> {
    create_key_dir(dir)?;

    let pair = LocalKeyPair::generate();

    write_key_file(
        &dir.join(PUBLIC_KEY_FILE_NAME),
        pair.public_key().as_bytes(),
        PUBLIC_KEY_MODE,
    )?;
    write_key_file(
        &dir.join(PRIVATE_KEY_FILE_NAME),
        pair.private_bytes().expose(),
        PRIVATE_KEY_MODE,
    )?;

    info!(
        "Generated identity {} in {}",
        pair.key_ref(),
        dir.display()
    );
    Ok(pair)
}

/// Load the identity stored in `dir`.
///
/// Both files are permission checked before they are read, and the private
/// key must belong to the public key next to it.
pub fn load_identity(dir: &Path) -> Result<LocalKeyPair, KeyError> {
    ensure_key_dir(dir)?;

    let public_path = dir.join(PUBLIC_KEY_FILE_NAME);
    check_key_file(&public_path, FilePolicy::NoForeignWrite)?;
    let public_bytes = read_exact_size::<PUBLIC_KEY_LENGTH>(&public_path)?;

    let private_path = dir.join(PRIVATE_KEY_FILE_NAME);
    check_key_file(&private_path, FilePolicy::OwnerOnly)?;
    let private_bytes = read_exact_size::<PRIVATE_KEY_LENGTH>(&private_path)?;

    let signing_key =
        SigningKey::from_keypair_bytes(private_bytes.expose()).map_err(|e| KeyError::Invalid {
            path: private_path.clone(),
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

    if signing_key.verifying_key().as_bytes() != public_bytes.expose() {
        return Err(KeyError::Invalid {
            path: public_path,
            message: String::from("public key does not match the private key"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    Ok(LocalKeyPair { signing_key })
}

fn create_key_dir(dir: &Path) -> Result<(), KeyError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(KEY_DIR_MODE);
    }

    builder.create(dir).map_err(|e| KeyError::Write {
        path: dir.to_path_buf(),
        source: e,
        location: ErrorLocation::from(Location::caller()),
    })?;

    // The builder mode only applies to directories it creates
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(KEY_DIR_MODE)).map_err(|e| {
            KeyError::Write {
                path: dir.to_path_buf(),
                source: e,
                location: ErrorLocation::from(Location::caller()),
            }
        })?;
    }

    ensure_key_dir(dir)
}

fn read_exact_size<const N: usize>(path: &Path) -> Result<SecretBytes<N>, KeyError> {
    let mut bytes = fs::read(path).map_err(|e| KeyError::Read {
        path: path.to_path_buf(),
        source: e,
        location: ErrorLocation::from(Location::caller()),
    })?;

    let result = SecretBytes::<N>::from_slice(&bytes).map_err(|_| KeyError::Size {
        path: path.to_path_buf(),
        expected: N,
        actual: bytes.len(),
        location: ErrorLocation::from(Location::caller()),
    });

    zeroize::Zeroize::zeroize(&mut bytes);
    result
}
