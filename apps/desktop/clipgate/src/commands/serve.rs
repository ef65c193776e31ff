//! `clipgate serve`: load config, apply overrides, serve until Ctrl+C.

use crate::cli::ServeArgs;
use crate::controller::ServiceController;
use crate::error::AppError;

use remote_core::config::{ServiceConfig, default_config_dir};
use remote_core::service::SystemDesktop;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use tokio::signal::ctrl_c;

/// Loaded config with `args` applied, saved back when `--save` was given.
pub fn resolve_config(args: &ServeArgs, config_dir: &Path) -> Result<ServiceConfig, AppError> {
    let mut config = ServiceConfig::load(config_dir)?;
    args.apply(&mut config);

    if args.save {
        config.save(config_dir)?;
    }

    Ok(config)
}

pub async fn run(args: ServeArgs, config_dir: Option<PathBuf>) -> Result<(), AppError> {
    let config_dir = match config_dir {
        Some(dir) => dir,
        None => default_config_dir()?,
    };
    let config = resolve_config(&args, &config_dir)?;

    let controller = ServiceController::new(Arc::new(SystemDesktop::new()));
    controller.start(config).await?;

    tokio::select! {
        signal = ctrl_c() => {
            match signal {
                Ok(()) => info!("Interrupted, stopping remote control"),
                Err(e) => warn!("Failed to listen for Ctrl+C, stopping: {e}"),
            }
        }
        () = controller.finished() => {
            info!("Remote control ended");
        }
    }

    controller.stop().await
}
