pub mod params;

pub use params::ServiceParams;

use crate::allow_list::AllowRange;
use crate::error::{AllowListError, ConfigError, KeyError};
use crate::keys::default_key_dir;
use crate::service::LineEnding;
use crate::{DEFAULT_ALLOW, DEFAULT_BIND_ADDRESS, DEFAULT_PORT};

use common::ErrorLocation;

use std::net::{IpAddr, SocketAddr};
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_DIR_NAME: &str = "clipgate";
const CONFIG_VERSION: u32 = 1;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Comma separated addresses and CIDR prefixes allowed to connect.
    #[serde(default = "default_allow")]
    pub allow: String,

    /// Applied to copied text when the call does not ask for a policy.
    #[serde(default)]
    pub line_ending: Option<LineEnding>,

    /// Require signed frames from trusted keys.
    #[serde(default = "default_signed")]
    pub signed: bool,

    /// Overrides `~/.clipgate`.
    #[serde(default)]
    pub key_dir: Option<PathBuf>,

    /// Seconds a session may stay silent before it is closed, `0` for never.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    #[serde(default)]
    pub ignore_session_lock: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            port: default_port(),
            bind_address: default_bind_address(),
            allow: default_allow(),
            line_ending: None,
            signed: default_signed(),
            key_dir: None,
            idle_timeout_secs: default_idle_timeout_secs(),
            ignore_session_lock: false,
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}
fn default_allow() -> String {
    DEFAULT_ALLOW.to_string()
}
fn default_signed() -> bool {
    true
}
fn default_idle_timeout_secs() -> u64 {
    300
}

/// `<config_dir>/clipgate`
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or_else(|| ConfigError::DirectoryNotFound {
            location: ErrorLocation::from(Location::caller()),
            reason: "unable to resolve the platform config directory".to_string(),
        })
}

// ============================================
// IMPLEMENTATION
// ============================================

impl ServiceConfig {
    /// Load config from {config_dir}/config.json.
    ///
    /// # Returns
    ///
    /// Returns `Ok(ServiceConfig)` if loaded successfully or defaults if file missing.
    /// Returns `Err(ConfigError)` if file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: ServiceConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/config.json using atomic write.
    ///
    /// Uses temp file + rename for atomicity (no corruption on crash).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if:
    /// - Validation fails
    /// - Directory creation fails
    /// - Serialization fails
    /// - Write or rename fails
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        if self.port == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "port cannot be 0 in a saved configuration".to_string(),
            });
        }

        self.bind_ip()?;

        self.allow_range().map_err(|e| ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("Invalid allow list: {e}"),
        })?;

        Ok(())
    }

    /// Fold command line parameters over the loaded values.
    pub fn apply_params(&mut self, params: &ServiceParams) {
        if let Some(port) = params.port {
            self.port = port;
        }
        if let Some(allow) = &params.allow {
            self.allow = allow.clone();
        }
        if let Some(line_ending) = params.line_ending {
            self.line_ending = Some(line_ending);
        }
    }

    pub fn allow_range(&self) -> Result<AllowRange, AllowListError> {
        AllowRange::new(&self.allow)
    }

    pub fn bind_ip(&self) -> Result<IpAddr, ConfigError> {
        self.bind_address
            .trim()
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Invalid bind address '{}': {e}", self.bind_address),
            })
    }

    /// Address to listen on. Port `0` asks the OS for a free port.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(SocketAddr::new(self.bind_ip()?, self.port))
    }

    pub fn resolved_key_dir(&self) -> Result<PathBuf, KeyError> {
        match &self.key_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_key_dir(),
        }
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}
