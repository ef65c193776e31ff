use crate::error::KeyError;

use common::ErrorLocation;

use std::fs;
use std::panic::Location;
use std::path::Path;

/// Permission policy applied to a key file before it is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePolicy {
    /// No group or other bits at all (`trusted`, `key`).
    OwnerOnly,
    /// Readable by anyone, writable only by the owner (`key.pub`).
    NoForeignWrite,
}

impl FilePolicy {
    #[cfg(unix)]
    const fn forbidden_bits(self) -> u32 {
        match self {
            FilePolicy::OwnerOnly => 0o077,
            FilePolicy::NoForeignWrite => 0o022,
        }
    }
}

/// Verify that `path` is a regular file whose mode satisfies `policy`.
///
/// On non-Unix platforms only the regular-file check applies.
///
/// # Errors
///
/// - [`KeyError::Read`] if the file cannot be inspected
/// - [`KeyError::NotARegularFile`] for directories, sockets and the like
/// - [`KeyError::Permissions`] carrying the offending mode
pub fn check_key_file(path: &Path, policy: FilePolicy) -> Result<(), KeyError> {
    let metadata = fs::metadata(path).map_err(|e| KeyError::Read {
        path: path.to_path_buf(),
        source: e,
        location: ErrorLocation::from(Location::caller()),
    })?;

    if !metadata.is_file() {
        return Err(KeyError::NotARegularFile {
            path: path.to_path_buf(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mode = metadata.permissions().mode() & 0o777;
        if mode & policy.forbidden_bits() != 0 {
            return Err(KeyError::Permissions {
                path: path.to_path_buf(),
                mode,
                location: ErrorLocation::from(Location::caller()),
            });
        }
    }

    #[cfg(not(unix))]
    let _ = policy;

    Ok(())
}

/// Write `bytes` to `path`, creating or truncating it, and leave it with
/// exactly `mode` on Unix regardless of umask or a previous mode.
pub(crate) fn write_key_file(path: &Path, bytes: &[u8], mode: u32) -> Result<(), KeyError> {
    use std::io::Write;

    let write_error = |e| KeyError::Write {
        path: path.to_path_buf(),
        source: e,
        location: ErrorLocation::from(Location::caller()),
    };

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }

    let mut file = options.open(path).map_err(write_error)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(mode))
            .map_err(write_error)?;
    }

    #[cfg(not(unix))]
    let _ = mode;

    file.write_all(bytes).map_err(write_error)?;
    file.sync_all().map_err(write_error)
}
