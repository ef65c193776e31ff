//! Fixed-size secret material with redacted Debug output.

use crate::{ErrorLocation, RedactError};

use std::fmt;
use std::panic::Location;

use serde::ser::Error;
use zeroize::Zeroize;

/// Secret bytes (private keys, seeds) that never expose their value in logs
/// or debug output and are wiped from memory on drop.
#[derive(Clone)]
pub struct SecretBytes<const N: usize> {
    inner: [u8; N],
}

impl<const N: usize> SecretBytes<N> {
    /// Wrap an owned array.
    pub fn new(bytes: [u8; N]) -> Self {
        Self { inner: bytes }
    }

    /// Copy secret material out of a slice, failing if the length is not `N`.
    #[track_caller]
    pub fn from_slice(bytes: &[u8]) -> Result<Self, RedactError> {
        if bytes.len() != N {
            return Err(RedactError::Length {
                expected: N,
                actual: bytes.len(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        let mut inner = [0u8; N];
        inner.copy_from_slice(bytes);
        Ok(Self { inner })
    }

    /// Borrow the raw bytes.
    ///
    /// # Security Note
    /// Only call this where the key material is actually consumed
    /// (signing, writing the owner-only key file).
    #[inline]
    pub fn expose(&self) -> &[u8; N] {
        &self.inner
    }

    /// Length in bytes (safe to log).
    #[inline]
    pub const fn len(&self) -> usize {
        N
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}

impl<const N: usize> fmt::Debug for SecretBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes<{N}>([REDACTED])")
    }
}

impl<const N: usize> fmt::Display for SecretBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED {N} BYTES]")
    }
}

impl<const N: usize> Drop for SecretBytes<N> {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl<const N: usize> serde::Serialize for SecretBytes<N> {
    #[track_caller]
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Err(S::Error::custom(RedactError::Serialization {
            message: String::from("SecretBytes cannot be serialized - use expose() explicitly"),
            location: ErrorLocation::from(Location::caller()),
        }))
    }
}
