//! Test helpers for clipgate integration tests.

use remote_core::config::ServiceConfig;
use remote_core::error::DesktopError;
use remote_core::service::DesktopAccess;

use std::sync::{Arc, Mutex};

/// In-memory desktop recording what remote calls did.
#[derive(Default)]
pub struct RecordingDesktop {
    pub clipboard: Mutex<String>,
    pub opened: Mutex<Vec<String>>,
}

impl RecordingDesktop {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn clipboard(&self) -> String {
        self.clipboard.lock().unwrap().clone()
    }
}

impl DesktopAccess for RecordingDesktop {
    fn clipboard_read(&self) -> Result<String, DesktopError> {
        Ok(self.clipboard())
    }

    fn clipboard_write(&self, text: &str) -> Result<(), DesktopError> {
        *self.clipboard.lock().unwrap() = text.to_string();
        Ok(())
    }

    fn open_uri(&self, uri: &str) -> Result<(), DesktopError> {
        self.opened.lock().unwrap().push(uri.to_string());
        Ok(())
    }

    fn is_session_locked(&self) -> bool {
        false
    }
}

/// Loopback-only config on an OS-chosen port.
pub fn loopback_config(signed: bool) -> ServiceConfig {
    ServiceConfig {
        port: 0,
        bind_address: String::from("127.0.0.1"),
        allow: String::from("127.0.0.1"),
        signed,
        ..ServiceConfig::default()
    }
}
