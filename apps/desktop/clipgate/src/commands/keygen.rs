//! `clipgate keygen`: create the key pair this host signs calls with.

use crate::cli::KeygenArgs;
use crate::error::AppError;

use remote_core::keys::{
    LocalKeyPair, PRIVATE_KEY_FILE_NAME, TRUSTED_FILE_NAME, default_key_dir, generate_identity,
};

use log::info;

/// Generate the key pair into the key directory and return it.
///
/// # Errors
///
/// Refuses to replace an existing private key unless `--force` is given.
pub fn run(args: &KeygenArgs) -> Result<LocalKeyPair, AppError> {
    let key_dir = match &args.key_dir {
        Some(dir) => dir.clone(),
        None => default_key_dir()?,
    };

    let private_key_path = key_dir.join(PRIVATE_KEY_FILE_NAME);
    if private_key_path.exists() && !args.force {
        return Err(AppError::clipgate(format!(
            "A key pair already exists at {} - pass --force to replace it",
            private_key_path.display()
        )));
    }

    let identity = generate_identity(&key_dir)?;

    info!(
        "Generated key pair in {} (key reference {})",
        key_dir.display(),
        identity.key_ref()
    );
    info!(
        "Add the public key below to the '{TRUSTED_FILE_NAME}' file of every server this host calls"
    );

    Ok(identity)
}
