use crate::error::DesktopError;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use arboard::Clipboard;

/// Local desktop primitives the remote calls act on.
///
/// Implementations may block; callers run them off the async workers.
pub trait DesktopAccess: Send + Sync {
    fn clipboard_read(&self) -> Result<String, DesktopError>;

    fn clipboard_write(&self, text: &str) -> Result<(), DesktopError>;

    /// Hand `uri` to the platform's default handler.
    fn open_uri(&self, uri: &str) -> Result<(), DesktopError>;

    /// True while the interactive session is locked.
    fn is_session_locked(&self) -> bool;
}

/// The real desktop: system clipboard and default URI handler.
///
/// There is no portable lock-state query, so the host application reports
/// lock and unlock through [`SystemDesktop::set_session_locked`].
///
/// The clipboard handle is opened on first use and kept for the life of the
/// desktop. On X11 and Wayland the selection is served by that handle, so
/// dropping it after a write would lose the copied text.
#[derive(Clone, Default)]
pub struct SystemDesktop {
    session_locked: Arc<AtomicBool>,
    clipboard: Arc<Mutex<Option<Clipboard>>>,
}

impl SystemDesktop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_session_locked(&self, locked: bool) {
        self.session_locked.store(locked, Ordering::SeqCst);
    }

    /// Run `action` on the retained clipboard, opening it if needed.
    fn with_clipboard<T>(
        &self,
        action: impl FnOnce(&mut Clipboard) -> Result<T, arboard::Error>,
    ) -> Result<T, DesktopError> {
        let mut slot = self
            .clipboard
            .lock()
            .map_err(|_| DesktopError::clipboard("clipboard handle poisoned"))?;

        let mut clipboard = match slot.take() {
            Some(clipboard) => clipboard,
            None => Clipboard::new().map_err(|e| DesktopError::clipboard(e.to_string()))?,
        };

        let result = action(&mut clipboard);
        *slot = Some(clipboard);

        result.map_err(|e| DesktopError::clipboard(e.to_string()))
    }
}

impl fmt::Debug for SystemDesktop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemDesktop")
            .field("session_locked", &self.session_locked.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl DesktopAccess for SystemDesktop {
    fn clipboard_read(&self) -> Result<String, DesktopError> {
        self.with_clipboard(|clipboard| clipboard.get_text())
    }

    fn clipboard_write(&self, text: &str) -> Result<(), DesktopError> {
        self.with_clipboard(|clipboard| clipboard.set_text(text.to_owned()))
    }

    fn open_uri(&self, uri: &str) -> Result<(), DesktopError> {
        open::that(uri).map_err(|e| DesktopError::open_uri(uri, e.to_string()))
    }

    fn is_session_locked(&self) -> bool {
        self.session_locked.load(Ordering::SeqCst)
    }
}
