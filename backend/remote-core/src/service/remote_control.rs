use crate::error::{DesktopError, RpcError};
use crate::proto::rpc_call::Call;
use crate::proto::{CopyArgs, OpenArgs, RpcCall, RpcReply};
use crate::service::desktop::DesktopAccess;
use crate::service::gate::{CallerTicket, RendezvousGate};
use crate::service::line_ending::{LineEnding, convert_line_ending};
use crate::service::loopback::translate_loopback;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use log::{info, warn};
use tokio::task::spawn_blocking;

const GATE_UNAVAILABLE: &str = "remote control is shutting down";

/// Executes decoded calls against the local desktop.
///
/// In the plain variant every call passes the [`RendezvousGate`] first, which
/// serialises calls across sessions. The signed variant runs calls directly
/// with the caller of the session that received them.
pub struct RemoteControl {
    desktop: Arc<dyn DesktopAccess>,
    default_line_ending: Option<LineEnding>,
    ignore_session_lock: bool,
    gate: Option<RendezvousGate>,
}

impl RemoteControl {
    pub fn new(
        desktop: Arc<dyn DesktopAccess>,
        default_line_ending: Option<LineEnding>,
        ignore_session_lock: bool,
    ) -> Self {
        Self {
            desktop,
            default_line_ending,
            ignore_session_lock,
            gate: None,
        }
    }

    /// Serialise calls through a rendezvous gate.
    pub fn gated(mut self) -> Self {
        self.gate = Some(RendezvousGate::new());
        self
    }

    pub fn is_gated(&self) -> bool {
        self.gate.is_some()
    }

    /// Run one call and build its reply.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::EmptyCall`] when the call names no operation. That
    /// is a protocol violation and the session ends; failures of the operation
    /// itself are reported inside the reply instead.
    pub async fn dispatch(&self, call: RpcCall, caller: CallerTicket) -> Result<RpcReply, RpcError> {
        let seq = call.seq;
        let Some(operation) = call.call else {
            return Err(RpcError::EmptyCall {
                seq,
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let Some(gate) = &self.gate else {
            return Ok(self.execute(seq, operation, caller).await);
        };

        match gate.admit(caller).await {
            Ok(admission) => Ok(self.execute(seq, operation, admission.ticket()).await),
            Err(e) => {
                warn!("Call {seq} from {} not admitted: {e}", caller.peer());
                Ok(RpcReply::failure(seq, GATE_UNAVAILABLE.to_string()))
            }
        }
    }

    async fn execute(&self, seq: u64, operation: Call, caller: CallerTicket) -> RpcReply {
        let method = operation.method();

        if self.desktop.is_session_locked() && !self.ignore_session_lock {
            let e = DesktopError::session_locked();
            warn!("{method} call {seq} from {} refused: {e}", caller.peer());
            return failure_reply(seq, &operation, &e);
        }

        let result = match &operation {
            Call::Copy(args) => self
                .copy(seq, args, caller)
                .await
                .map(|()| RpcReply::done(seq)),
            Call::Paste(_) => self
                .paste(seq, caller)
                .await
                .map(|text| RpcReply::paste(seq, text)),
            Call::Open(args) => self
                .open(seq, args, caller)
                .await
                .map(|()| RpcReply::done(seq)),
        };

        result.unwrap_or_else(|e| {
            warn!("{method} call {seq} from {} failed: {e}", caller.peer());
            failure_reply(seq, &operation, &e)
        })
    }

    /// Run a desktop primitive on the blocking pool.
    async fn on_desktop<T, F>(&self, action: F) -> Result<T, DesktopError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn DesktopAccess) -> Result<T, DesktopError> + Send + 'static,
    {
        let desktop = Arc::clone(&self.desktop);
        spawn_blocking(move || action(desktop.as_ref()))
            .await
            .map_err(|e| DesktopError::task(e.to_string()))?
    }

    async fn copy(
        &self,
        seq: u64,
        args: &CopyArgs,
        caller: CallerTicket,
    ) -> Result<(), DesktopError> {
        info!(
            "Copy call {seq} from {} [{}] with {} bytes",
            caller.peer(),
            caller.session_id(),
            args.text.len()
        );

        let requested: Option<LineEnding> = args.line_ending().into();
        let policy = requested.or(self.default_line_ending);

        let text = convert_line_ending(&args.text, policy).into_owned();

        self.on_desktop(move |desktop| desktop.clipboard_write(&text))
            .await
    }

    async fn paste(&self, seq: u64, caller: CallerTicket) -> Result<String, DesktopError> {
        let text = self
            .on_desktop(|desktop| desktop.clipboard_read())
            .await?;
        info!(
            "Paste call {seq} from {} [{}] returned {} bytes",
            caller.peer(),
            caller.session_id(),
            text.len()
        );
        Ok(text)
    }

    async fn open(
        &self,
        seq: u64,
        args: &OpenArgs,
        caller: CallerTicket,
    ) -> Result<(), DesktopError> {
        info!(
            "Open call {seq} from {} [{}] with {} bytes, translate loopback: {}",
            caller.peer(),
            caller.session_id(),
            args.uri.len(),
            args.translate_loopback
        );

        let uri = if args.translate_loopback {
            translate_loopback(&args.uri, caller.ip()).into_owned()
        } else {
            args.uri.clone()
        };

        self.on_desktop(move |desktop| desktop.open_uri(&uri)).await
    }
}

fn failure_reply(seq: u64, operation: &Call, error: &DesktopError) -> RpcReply {
    match operation {
        Call::Paste(_) => RpcReply::paste_failure(seq, error.caller_message()),
        Call::Copy(_) | Call::Open(_) => RpcReply::failure(seq, error.caller_message()),
    }
}
