use crate::error::FrameError;
use crate::keys::{KEY_REF_LENGTH, KeyRef, LocalKeyPair, TrustedKeys};
use crate::{PROTOCOL_MAJOR, PROTOCOL_MINOR, PROTOCOL_NAME, PROTOCOL_PATCH};

use common::ErrorLocation;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;
use std::sync::Arc;

use ed25519_dalek::{SIGNATURE_LENGTH, Signature, Verifier};

pub const TAG_LENGTH: usize = 8;
/// Name and major version. Minor and patch differences are tolerated.
const TAG_CHECKED_LENGTH: usize = 6;

/// Protocol tag leading a signed frame: name, major, minor, patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolTag([u8; TAG_LENGTH]);

impl ProtocolTag {
    pub fn current() -> Self {
        Self::new(PROTOCOL_MAJOR, PROTOCOL_MINOR, PROTOCOL_PATCH)
    }

    pub fn new(major: u8, minor: u8, patch: u8) -> Self {
        let mut tag = [0u8; TAG_LENGTH];
        tag[..PROTOCOL_NAME.len()].copy_from_slice(PROTOCOL_NAME);
        tag[PROTOCOL_NAME.len()] = major;
        tag[PROTOCOL_NAME.len() + 1] = minor;
        tag[PROTOCOL_NAME.len() + 2] = patch;
        Self(tag)
    }

    pub fn from_bytes(bytes: [u8; TAG_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TAG_LENGTH] {
        &self.0
    }

    pub fn is_compatible(&self, other: &ProtocolTag) -> bool {
        self.0[..TAG_CHECKED_LENGTH] == other.0[..TAG_CHECKED_LENGTH]
    }
}

impl Display for ProtocolTag {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let name_length = PROTOCOL_NAME.len();
        write!(
            formatter,
            "{} {}.{}.{}",
            String::from_utf8_lossy(&self.0[..name_length]),
            self.0[name_length],
            self.0[name_length + 1],
            self.0[name_length + 2]
        )
    }
}

/// Bytes in front of the payload of a signed frame.
pub const fn envelope_length(tagged: bool) -> usize {
    let tag = if tagged { TAG_LENGTH } else { 0 };
    tag + KEY_REF_LENGTH + SIGNATURE_LENGTH
}

/// Server side of the signed transport.
///
/// Stateless: every frame names its signer and is verified on its own, so no
/// identity is ever pinned to a connection.
#[derive(Debug, Clone)]
pub struct FrameVerifier {
    trusted: Arc<TrustedKeys>,
    tag: Option<ProtocolTag>,
}

impl FrameVerifier {
    pub fn new(trusted: Arc<TrustedKeys>) -> Self {
        Self {
            trusted,
            tag: Some(ProtocolTag::current()),
        }
    }

    /// Frames carry no protocol tag.
    pub fn untagged(trusted: Arc<TrustedKeys>) -> Self {
        Self { trusted, tag: None }
    }

    pub fn trusted(&self) -> &TrustedKeys {
        &self.trusted
    }

    /// Check one inbound frame and return its payload.
    ///
    /// # Errors
    ///
    /// - [`FrameError::ShortFrame`] when nothing follows the envelope
    /// - [`FrameError::BadTag`] on a name or major version mismatch, before
    ///   any key is looked up
    /// - [`FrameError::UnknownKey`] when the key reference is not trusted
    /// - [`FrameError::BadSignature`] when the payload fails verification
    pub fn open(&self, frame: &[u8]) -> Result<Vec<u8>, FrameError> {
        let minimum = envelope_length(self.tag.is_some());
        if frame.len() <= minimum {
            return Err(FrameError::ShortFrame {
                length: frame.len(),
                minimum,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut rest = frame;

        if let Some(expected) = &self.tag {
            let (tag_bytes, tail) = rest.split_at(TAG_LENGTH);
            let mut actual = [0u8; TAG_LENGTH];
            actual.copy_from_slice(tag_bytes);
            let actual = ProtocolTag::from_bytes(actual);

            if !expected.is_compatible(&actual) {
                return Err(FrameError::BadTag {
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            rest = tail;
        }

        let (key_ref_bytes, tail) = rest.split_at(KEY_REF_LENGTH);
        let mut key_ref = [0u8; KEY_REF_LENGTH];
        key_ref.copy_from_slice(key_ref_bytes);
        let key_ref = KeyRef::from_bytes(key_ref);

        let Some(key) = self.trusted.get(&key_ref) else {
            return Err(FrameError::UnknownKey {
                key_ref: key_ref.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let (signature_bytes, payload) = tail.split_at(SIGNATURE_LENGTH);
        let mut signature = [0u8; SIGNATURE_LENGTH];
        signature.copy_from_slice(signature_bytes);
        let signature = Signature::from_bytes(&signature);

        key.verify(payload, &signature)
            .map_err(|_| FrameError::BadSignature {
                key_ref: key_ref.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(payload.to_vec())
    }
}

/// Client side of the signed transport.
#[derive(Debug, Clone)]
pub struct FrameSigner {
    identity: Arc<LocalKeyPair>,
    key_ref: KeyRef,
    tag: Option<ProtocolTag>,
}

impl FrameSigner {
    pub fn new(identity: Arc<LocalKeyPair>) -> Self {
        Self::with_tag(identity, Some(ProtocolTag::current()))
    }

    pub fn with_tag(identity: Arc<LocalKeyPair>, tag: Option<ProtocolTag>) -> Self {
        let key_ref = identity.key_ref();
        Self {
            identity,
            key_ref,
            tag,
        }
    }

    pub fn key_ref(&self) -> KeyRef {
        self.key_ref
    }

    /// `[tag][key ref][signature][payload]`
    pub fn seal(&self, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(envelope_length(self.tag.is_some()) + payload.len());

        if let Some(tag) = &self.tag {
            frame.extend_from_slice(tag.as_bytes());
        }
        frame.extend_from_slice(self.key_ref.as_bytes());
        frame.extend_from_slice(&self.identity.sign(payload).to_bytes());
        frame.extend_from_slice(payload);

        frame
    }
}
