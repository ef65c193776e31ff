use crate::error::FrameError;
use crate::transport::frame::FrameVerifier;

use std::borrow::Cow;

/// How inbound frames of a session are turned into call bytes.
///
/// Outbound replies are never signed, in either variant.
#[derive(Debug, Clone)]
pub enum SessionTransport {
    /// Frames are the encoded call.
    Plain,
    /// Frames are signed envelopes checked against the trusted set.
    Signed(FrameVerifier),
}

impl SessionTransport {
    pub fn open_inbound<'a>(&self, frame: &'a [u8]) -> Result<Cow<'a, [u8]>, FrameError> {
        match self {
            SessionTransport::Plain => Ok(Cow::Borrowed(frame)),
            SessionTransport::Signed(verifier) => verifier.open(frame).map(Cow::Owned),
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, SessionTransport::Signed(_))
    }
}
