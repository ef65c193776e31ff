//! Remote-control server: accept loop and per-connection sessions.
//!
//! # Protocol
//!
//! WebSocket with one binary message per call. In the signed variant each
//! message is a signed frame (see [`crate::transport::frame`]) around an
//! encoded [`RpcCall`](crate::proto::RpcCall); in the plain variant it is the
//! encoded call itself. Every accepted call is answered with one encoded
//! [`RpcReply`](crate::proto::RpcReply).

pub mod acceptor;
mod session;

pub use acceptor::RemoteControlServer;

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::keys::load_trusted_set;
use crate::service::DesktopAccess;
use crate::transport::{FrameVerifier, SessionTransport};

use std::sync::Arc;

use log::{info, warn};
use tokio_util::sync::CancellationToken;

/// Work out the transport `config` asks for.
///
/// Returns `Ok(None)` when remote control should stay off: signed mode with
/// no key directory, or a trusted set without a single usable key.
///
/// # Errors
///
/// Any key directory problem other than its absence, permission violations in
/// particular.
pub fn session_transport(config: &ServiceConfig) -> Result<Option<SessionTransport>, ServiceError> {
    if !config.signed {
        warn!("Remote control runs unsigned, any allowed address may call it");
        return Ok(Some(SessionTransport::Plain));
    }

    let key_dir = config.resolved_key_dir()?;
    let trusted = match load_trusted_set(&key_dir) {
        Ok(trusted) => trusted,
        Err(e) if e.is_not_configured() => {
            info!("Remote control not configured: {e}");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    if trusted.is_empty() {
        info!(
            "Remote control not started: no trusted keys in {}",
            key_dir.display()
        );
        return Ok(None);
    }

    Ok(Some(SessionTransport::Signed(FrameVerifier::new(Arc::new(
        trusted,
    )))))
}

/// Load trust, bind and serve until `cancel` fires.
///
/// Returns `Ok(())` without listening when remote control is not configured.
pub async fn start_service(
    config: ServiceConfig,
    desktop: Arc<dyn DesktopAccess>,
    cancel: CancellationToken,
) -> Result<(), ServiceError> {
    let Some(transport) = session_transport(&config)? else {
        return Ok(());
    };

    let server = RemoteControlServer::bind(&config, transport, desktop).await?;
    server.run(cancel).await
}
