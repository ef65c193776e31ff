// Remote-control wire messages (package: clipgate.rpc)
//
// Declared with the prost derives directly; the schema is small and stable
// enough that a build step would only add a protoc dependency.

use crate::service::LineEnding;

use prost::{Enumeration, Message, Oneof};

/// One remote call. Exactly one operation must be set.
#[derive(Clone, PartialEq, Message)]
pub struct RpcCall {
    #[prost(uint64, tag = "1")]
    pub seq: u64,
    #[prost(oneof = "rpc_call::Call", tags = "2, 3, 4")]
    pub call: Option<rpc_call::Call>,
}

pub mod rpc_call {
    use super::Oneof;

    #[derive(Clone, PartialEq, Oneof)]
    pub enum Call {
        #[prost(message, tag = "2")]
        Copy(super::CopyArgs),
        #[prost(message, tag = "3")]
        Paste(super::PasteArgs),
        #[prost(message, tag = "4")]
        Open(super::OpenArgs),
    }

    impl Call {
        /// Method name for logs.
        pub fn method(&self) -> &'static str {
            match self {
                Call::Copy(_) => "Copy",
                Call::Paste(_) => "Paste",
                Call::Open(_) => "Open",
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Enumeration)]
#[repr(i32)]
pub enum LineEndingKind {
    Unspecified = 0,
    Lf = 1,
    Crlf = 2,
}

impl From<Option<LineEnding>> for LineEndingKind {
    fn from(policy: Option<LineEnding>) -> Self {
        match policy {
            None => LineEndingKind::Unspecified,
            Some(LineEnding::Lf) => LineEndingKind::Lf,
            Some(LineEnding::Crlf) => LineEndingKind::Crlf,
        }
    }
}

impl From<LineEndingKind> for Option<LineEnding> {
    fn from(kind: LineEndingKind) -> Self {
        match kind {
            LineEndingKind::Unspecified => None,
            LineEndingKind::Lf => Some(LineEnding::Lf),
            LineEndingKind::Crlf => Some(LineEnding::Crlf),
        }
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct CopyArgs {
    #[prost(string, tag = "1")]
    pub text: String,
    #[prost(enumeration = "LineEndingKind", tag = "2")]
    pub line_ending: i32,
}

impl CopyArgs {
    pub fn new(text: impl Into<String>, policy: Option<LineEnding>) -> Self {
        Self {
            text: text.into(),
            line_ending: LineEndingKind::from(policy) as i32,
        }
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct PasteArgs {}

#[derive(Clone, PartialEq, Message)]
pub struct OpenArgs {
    #[prost(string, tag = "1")]
    pub uri: String,
    #[prost(bool, tag = "2")]
    pub translate_loopback: bool,
}

/// Answer to an [`RpcCall`] with the same `seq`.
///
/// `error` set means the call failed on the server; the session stays open.
#[derive(Clone, PartialEq, Message)]
pub struct RpcReply {
    #[prost(uint64, tag = "1")]
    pub seq: u64,
    #[prost(string, optional, tag = "2")]
    pub error: Option<String>,
    #[prost(oneof = "rpc_reply::Outcome", tags = "3, 4")]
    pub outcome: Option<rpc_reply::Outcome>,
}

pub mod rpc_reply {
    use super::Oneof;

    #[derive(Clone, PartialEq, Oneof)]
    pub enum Outcome {
        #[prost(message, tag = "3")]
        Done(super::Empty),
        #[prost(message, tag = "4")]
        Paste(super::PasteReply),
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct Empty {}

#[derive(Clone, PartialEq, Message)]
pub struct PasteReply {
    #[prost(string, tag = "1")]
    pub text: String,
}

impl RpcReply {
    pub fn done(seq: u64) -> Self {
        Self {
            seq,
            error: None,
            outcome: Some(rpc_reply::Outcome::Done(Empty {})),
        }
    }

    pub fn paste(seq: u64, text: String) -> Self {
        Self {
            seq,
            error: None,
            outcome: Some(rpc_reply::Outcome::Paste(PasteReply { text })),
        }
    }

    /// A failed paste still carries an (empty) text result.
    pub fn paste_failure(seq: u64, message: String) -> Self {
        Self {
            seq,
            error: Some(message),
            outcome: Some(rpc_reply::Outcome::Paste(PasteReply::default())),
        }
    }

    pub fn failure(seq: u64, message: String) -> Self {
        Self {
            seq,
            error: Some(message),
            outcome: None,
        }
    }
}
