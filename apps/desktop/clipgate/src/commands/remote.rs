//! `clipgate copy|paste|open`: one call against a remote clipgate.

use crate::cli::TargetArgs;
use crate::error::AppError;

use remote_core::client::RemoteClient;
use remote_core::keys::{default_key_dir, load_identity};
use remote_core::service::LineEnding;
use remote_core::transport::FrameSigner;

use std::io::{read_to_string, stdin};
use std::sync::Arc;

use log::debug;

/// Connect to the target, signing with the local key unless `--plain`.
pub async fn connect(target: &TargetArgs) -> Result<RemoteClient, AppError> {
    let signer = if target.plain {
        None
    } else {
        let key_dir = match &target.key_dir {
            Some(dir) => dir.clone(),
            None => default_key_dir()?,
        };
        let identity = load_identity(&key_dir)?;
        debug!("Signing calls as {}", identity.key_ref());
        Some(FrameSigner::new(Arc::new(identity)))
    };

    Ok(RemoteClient::connect(&target.server, signer).await?)
}

pub async fn copy(
    target: &TargetArgs,
    text: Option<String>,
    line_ending: Option<LineEnding>,
) -> Result<(), AppError> {
    let text = match text {
        Some(text) => text,
        None => read_to_string(stdin())
            .map_err(|e| AppError::clipgate(format!("Failed to read stdin: {e}")))?,
    };

    let mut client = connect(target).await?;
    client.copy(text, line_ending).await?;
    client.close().await?;
    Ok(())
}

pub async fn paste(target: &TargetArgs) -> Result<String, AppError> {
    let mut client = connect(target).await?;
    let text = client.paste().await?;
    client.close().await?;
    Ok(text)
}

pub async fn open(
    target: &TargetArgs,
    uri: String,
    translate_loopback: bool,
) -> Result<(), AppError> {
    let mut client = connect(target).await?;
    client.open(uri, translate_loopback).await?;
    client.close().await?;
    Ok(())
}
