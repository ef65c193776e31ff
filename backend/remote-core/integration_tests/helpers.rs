//! Test helpers for remote-control integration tests.
//!
//! - An in-memory desktop that records what the service did to it
//! - Starting a server on an OS-chosen port
//! - Raw WebSocket access for sending frames the real client never would

use remote_core::config::ServiceConfig;
use remote_core::error::{DesktopError, ServiceError};
use remote_core::keys::{LocalKeyPair, TRUSTED_FILE_NAME, TrustedKeys};
use remote_core::server::RemoteControlServer;
use remote_core::service::DesktopAccess;
use remote_core::transport::{FrameVerifier, SessionTransport};

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

pub type RawSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Desktop double. Clipboard writes can be slowed down to widen race
/// windows; overlapping writes are counted.
#[derive(Default)]
pub struct FakeDesktop {
    pub clipboard: Mutex<String>,
    pub opened: Mutex<Vec<String>>,
    pub locked: AtomicBool,
    pub write_delay: Mutex<Option<Duration>>,
    pub writes_in_progress: AtomicUsize,
    pub overlapping_writes: AtomicUsize,
}

impl FakeDesktop {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        let desktop = Self::default();
        *desktop.write_delay.lock().unwrap() = Some(delay);
        Arc::new(desktop)
    }

    pub fn clipboard(&self) -> String {
        self.clipboard.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl DesktopAccess for FakeDesktop {
    fn clipboard_read(&self) -> Result<String, DesktopError> {
        Ok(self.clipboard())
    }

    fn clipboard_write(&self, text: &str) -> Result<(), DesktopError> {
        if self.writes_in_progress.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapping_writes.fetch_add(1, Ordering::SeqCst);
        }

        let delay = *self.write_delay.lock().unwrap();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        *self.clipboard.lock().unwrap() = text.to_string();

        self.writes_in_progress.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    fn open_uri(&self, uri: &str) -> Result<(), DesktopError> {
        self.opened.lock().unwrap().push(uri.to_string());
        Ok(())
    }

    fn is_session_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }
}

/// Loopback-only config on an OS-chosen port.
pub fn test_config(signed: bool) -> ServiceConfig {
    ServiceConfig {
        port: 0,
        bind_address: String::from("127.0.0.1"),
        allow: String::from("127.0.0.1,::1"),
        signed,
        ..ServiceConfig::default()
    }
}

pub fn trusting(pairs: &[&LocalKeyPair]) -> SessionTransport {
    let mut trusted = TrustedKeys::new();
    for pair in pairs {
        trusted.insert(pair.public_key());
    }
    SessionTransport::Signed(FrameVerifier::new(Arc::new(trusted)))
}

/// Write `<dir>/trusted` with owner-only permissions.
pub fn write_trusted_file(dir: &Path, lines: &[String]) {
    let path = dir.join(TRUSTED_FILE_NAME);
    fs::write(&path, lines.join("\n")).expect("Failed to write trusted file");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
            .expect("Failed to set trusted file mode");
    }
}

pub struct RunningServer {
    pub addr: SocketAddr,
    pub cancel: CancellationToken,
    pub handle: JoinHandle<Result<(), ServiceError>>,
}

impl RunningServer {
    pub async fn stop(self) -> Result<(), ServiceError> {
        self.cancel.cancel();
        self.handle.await.expect("Server task panicked")
    }
}

/// Test helper: bind and run a server in the background.
pub async fn start_test_server(
    config: &ServiceConfig,
    transport: SessionTransport,
    desktop: Arc<dyn DesktopAccess>,
) -> RunningServer {
    let server = RemoteControlServer::bind(config, transport, desktop)
        .await
        .expect("Failed to bind test server");
    let addr = server.local_addr();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(server.run(cancel.clone()));

    RunningServer {
        addr,
        cancel,
        handle,
    }
}

/// Test helper: Connect a raw WebSocket.
pub async fn connect_raw(addr: SocketAddr) -> RawSocket {
    let (ws_stream, _) = connect_async(format!("ws://{addr}/"))
        .await
        .expect("Failed to connect to WebSocket server");
    ws_stream
}

pub async fn send_raw(ws: &mut RawSocket, bytes: Vec<u8>) {
    ws.send(Message::Binary(bytes.into()))
        .await
        .expect("Failed to send message");
}

/// True when the server ends the connection without sending a binary reply.
pub async fn is_connection_closed(ws: &mut RawSocket) -> bool {
    let next = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("Server neither replied nor closed");

    match next {
        None | Some(Ok(Message::Close(_))) | Some(Err(_)) => true,
        Some(Ok(_)) => false,
    }
}
