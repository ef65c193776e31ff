use crate::allow_list::AllowRange;
use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::server::session::{SessionContext, serve_session};
use crate::service::{DesktopAccess, RemoteControl};
use crate::transport::SessionTransport;

use common::ErrorLocation;

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::net::TcpListener;
use tokio::select;
use tokio::spawn as TokioSpawn;
use tokio_util::sync::CancellationToken;

/// Listening remote-control endpoint.
///
/// Created bound, so the actual address (port `0` included) is known before
/// [`run`](Self::run) starts accepting.
pub struct RemoteControlServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    allow: Arc<AllowRange>,
    context: Arc<SessionContext>,
}

impl RemoteControlServer {
    /// Bind `bind_address:port` from `config`.
    ///
    /// A plain transport serialises calls through the rendezvous gate; a
    /// signed one dispatches each call with its own session's caller.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::AllowList`] if the allow-list does not parse
    /// - [`ServiceError::Config`] if the bind address is not an IP address
    /// - [`ServiceError::Bind`] if the port is taken or not permitted
    pub async fn bind(
        config: &ServiceConfig,
        transport: SessionTransport,
        desktop: Arc<dyn DesktopAccess>,
    ) -> Result<Self, ServiceError> {
        let allow = Arc::new(config.allow_range()?);
        let address = config.socket_addr()?;

        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| ServiceError::Bind {
                address: address.to_string(),
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;
        let local_addr = listener.local_addr()?;

        let control = RemoteControl::new(desktop, config.line_ending, config.ignore_session_lock);
        let control = if transport.is_signed() {
            control
        } else {
            control.gated()
        };

        let context = Arc::new(SessionContext {
            control,
            transport,
            idle_timeout: config.idle_timeout(),
        });

        Ok(Self {
            listener,
            local_addr,
            allow,
            context,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until `cancel` fires.
    ///
    /// Peers outside the allow-list are dropped without a word. Sessions
    /// already running are left to finish on their own.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Accept`] when the listener fails for a reason
    /// other than a connection dying in the backlog. Cancellation is a normal
    /// shutdown and returns `Ok(())`.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ServiceError> {
        let variant = if self.context.transport.is_signed() {
            "signed"
        } else {
            "plain"
        };
        info!(
            "Remote control listening on {} ({variant}), allowing {}",
            self.local_addr, self.allow
        );

        loop {
            let accepted = select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Remote control on {} stopped", self.local_addr);
                    return Ok(());
                }
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer) = match accepted {
                Ok(accepted) => accepted,
                Err(e) if is_transient(e.kind()) => {
                    warn!("Connection dropped before accept: {e}");
                    continue;
                }
                Err(e) => {
                    error!("Remote control on {} failed: {e}", self.local_addr);
                    return Err(ServiceError::Accept {
                        message: e.to_string(),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            };

            if !self.allow.contains_peer(peer) {
                debug!("Refused connection from {peer}: not in allow list");
                continue;
            }

            let context = Arc::clone(&self.context);
            TokioSpawn(async move {
                if let Err(e) = serve_session(stream, peer, context).await {
                    warn!("Session with {peer} failed: {e}");
                }
            });
        }
    }
}

fn is_transient(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::Interrupted
    )
}
