pub mod frame;
pub mod session;

pub use frame::{FrameSigner, FrameVerifier, ProtocolTag, TAG_LENGTH, envelope_length};
pub use session::SessionTransport;

use crate::MAX_PAYLOAD_BYTES;

use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

/// Largest inbound WebSocket message: a full payload in a tagged envelope.
pub const MAX_FRAME_BYTES: usize = MAX_PAYLOAD_BYTES + envelope_length(true);

/// WebSocket limits shared by the server and the client.
pub fn websocket_config() -> WebSocketConfig {
    let mut config = WebSocketConfig::default();
    config.max_message_size = Some(MAX_FRAME_BYTES);
    config.max_frame_size = Some(MAX_FRAME_BYTES);
    config
}
