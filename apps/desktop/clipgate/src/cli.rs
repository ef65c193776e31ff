//! Command line surface.
//!
//! - `clipgate serve`  : run remote control until Ctrl+C
//! - `clipgate keygen` : create this host's key pair
//! - `clipgate copy` / `paste` / `open` : call a remote clipgate

use remote_core::DEFAULT_PORT;
use remote_core::config::{ServiceConfig, ServiceParams};
use remote_core::service::LineEnding;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Clipboard and URI remote control for trusted peers.
#[derive(Debug, Parser)]
#[command(name = "clipgate", version, about)]
pub struct Cli {
    /// Log at debug level.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Directory holding config.json (default: <config dir>/clipgate).
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve remote control on this desktop until interrupted.
    Serve(ServeArgs),

    /// Generate the local key pair used to sign calls.
    Keygen(KeygenArgs),

    /// Put text on the remote clipboard (reads stdin when TEXT is omitted).
    Copy {
        #[command(flatten)]
        target: TargetArgs,

        /// Line endings to apply on the remote side: lf or crlf.
        #[arg(long)]
        line_ending: Option<LineEnding>,

        text: Option<String>,
    },

    /// Print the remote clipboard.
    Paste {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Open a URI with the remote desktop's default handler.
    Open {
        #[command(flatten)]
        target: TargetArgs,

        /// Replace a loopback host with this machine's address as the server sees it.
        #[arg(long)]
        translate_loopback: bool,

        uri: String,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Compact overrides "port;allow;line_ending", e.g. "2850;10.0.0.0/8;crlf".
    pub params: Option<ServiceParams>,

    #[arg(long)]
    pub port: Option<u16>,

    /// Address to listen on.
    #[arg(long)]
    pub bind: Option<String>,

    /// Comma separated addresses and CIDR prefixes allowed to connect.
    #[arg(long)]
    pub allow: Option<String>,

    /// Default line endings for copied text: lf or crlf.
    #[arg(long)]
    pub line_ending: Option<LineEnding>,

    /// Accept unsigned calls from any allowed address.
    #[arg(long)]
    pub plain: bool,

    /// Key directory (default: ~/.clipgate).
    #[arg(long)]
    pub key_dir: Option<PathBuf>,

    /// Seconds before a silent connection is closed, 0 for never.
    #[arg(long)]
    pub idle_timeout: Option<u64>,

    /// Serve calls while the desktop session is locked.
    #[arg(long)]
    pub ignore_session_lock: bool,

    /// Write the resulting configuration back to config.json.
    #[arg(long)]
    pub save: bool,
}

impl ServeArgs {
    /// Fold these arguments over a loaded config. The parameter string goes
    /// first so explicit flags win over it.
    pub fn apply(&self, config: &mut ServiceConfig) {
        if let Some(params) = &self.params {
            config.apply_params(params);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bind) = &self.bind {
            config.bind_address = bind.clone();
        }
        if let Some(allow) = &self.allow {
            config.allow = allow.clone();
        }
        if let Some(line_ending) = self.line_ending {
            config.line_ending = Some(line_ending);
        }
        if self.plain {
            config.signed = false;
        }
        if let Some(key_dir) = &self.key_dir {
            config.key_dir = Some(key_dir.clone());
        }
        if let Some(idle_timeout) = self.idle_timeout {
            config.idle_timeout_secs = idle_timeout;
        }
        if self.ignore_session_lock {
            config.ignore_session_lock = true;
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct KeygenArgs {
    /// Key directory (default: ~/.clipgate).
    #[arg(long)]
    pub key_dir: Option<PathBuf>,

    /// Replace an existing key pair.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Remote clipgate as host:port.
    #[arg(long, short, default_value_t = default_server())]
    pub server: String,

    /// Send unsigned calls.
    #[arg(long)]
    pub plain: bool,

    /// Key directory holding the signing key (default: ~/.clipgate).
    #[arg(long)]
    pub key_dir: Option<PathBuf>,
}

fn default_server() -> String {
    format!("127.0.0.1:{DEFAULT_PORT}")
}
