pub mod allow_list;
pub mod client;
pub mod config;
pub mod error;
pub mod keys;
pub mod proto;
pub mod server;
pub mod service;
pub mod transport;

#[cfg(test)]
mod tests;

pub const DEFAULT_PORT: u16 = 2850;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_ALLOW: &str = "127.0.0.1,::1";

pub const PROTOCOL_NAME: &[u8; 5] = b"CGATE";
pub const PROTOCOL_MAJOR: u8 = 1;
pub const PROTOCOL_MINOR: u8 = 0;
pub const PROTOCOL_PATCH: u8 = 0;

/// Largest call payload accepted from a remote caller.
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;
