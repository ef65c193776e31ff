//! Shared building blocks for the clipgate workspace.
//!
//! - [`ErrorLocation`]: file/line/column attached to every error variant
//! - [`SecretBytes`]: fixed-size secret material that never shows up in logs

pub mod error;
pub mod secret_bytes;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use secret_bytes::SecretBytes;

#[cfg(test)]
mod tests;
