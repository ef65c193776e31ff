use crate::error::KeyError;
use crate::keys::{
    FilePolicy, KeyRef, LocalKeyPair, PRIVATE_KEY_FILE_NAME, PUBLIC_KEY_FILE_NAME,
    TRUSTED_FILE_NAME, TrustedKeys, check_key_file, generate_identity, load_identity,
    load_trusted_set,
};

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(unix)]
fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).unwrap().permissions().mode() & 0o777
}

fn write_trusted(dir: &Path, contents: &str) {
    let path = dir.join(TRUSTED_FILE_NAME);
    fs::write(&path, contents).unwrap();
    #[cfg(unix)]
    set_mode(&path, 0o600);
}

#[test]
fn given_public_key_when_computing_key_ref_then_it_is_sha256_of_key_bytes() {
    let pair = LocalKeyPair::generate();

    let key_ref = KeyRef::of(&pair.public_key());

    let expected: [u8; 32] = Sha256::digest(pair.public_key().as_bytes()).into();
    assert_eq!(key_ref.as_bytes(), &expected);
    assert_eq!(key_ref.to_string(), hex::encode(expected));
}

/// **VALUE**: Verifies the trusted-file parser keeps exactly the valid keys.
///
/// **WHY THIS MATTERS**: A hand-edited file will contain typos, comments and
/// duplicates; each must be skipped without losing the good keys.
///
/// **BUG THIS CATCHES**: Short keys being accepted, duplicates counted twice
/// or a single bad line aborting the whole load.
#[test]
fn given_valid_short_and_duplicate_keys_when_parsed_then_one_key_is_trusted() {
    // GIVEN: One valid key, one short key, the valid key again
    let pair = LocalKeyPair::generate();
    let valid = pair.public_hex();
    let contents = format!("{valid}\n{}\n{valid}\n", &valid[..40]);

    // WHEN: Parsing
    let trusted = TrustedKeys::parse(&contents, Path::new("trusted"));

    // THEN: Exactly the valid key
    assert_eq!(trusted.len(), 1);
    assert!(trusted.contains(&pair.key_ref()));
}

#[test]
fn given_comments_blank_lines_and_crlf_when_parsed_then_keys_are_found() {
    let first = LocalKeyPair::generate();
    let second = LocalKeyPair::generate();
    let contents = format!(
        "# laptop\r\n\r\n  {}  \r\n#{}\r\n{}",
        first.public_hex(),
        second.public_hex(),
        second.public_hex().to_uppercase()
    );

    let trusted = TrustedKeys::parse(&contents, Path::new("trusted"));

    assert_eq!(trusted.len(), 2);
    assert!(trusted.contains(&first.key_ref()));
    assert!(trusted.contains(&second.key_ref()));
}

#[test]
fn given_bad_hex_of_right_length_when_parsed_then_line_is_skipped() {
    let contents = "zz".repeat(32);

    let trusted = TrustedKeys::parse(&contents, Path::new("trusted"));

    assert!(trusted.is_empty());
}

#[test]
fn given_missing_key_dir_when_loading_trusted_set_then_not_configured() {
    // GIVEN: A directory that does not exist
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("absent");

    // WHEN: Loading the trusted set
    let result = load_trusted_set(&missing);

    // THEN: Reported as "not configured", which callers treat as "off"
    let err = result.unwrap_err();
    assert!(err.is_not_configured(), "got {err:?}");
}

#[test]
fn given_key_dir_is_a_file_when_loading_trusted_set_then_not_a_directory() {
    let temp = tempfile::tempdir().unwrap();
    let file = temp.path().join("plain-file");
    fs::write(&file, b"x").unwrap();

    let result = load_trusted_set(&file);

    assert!(matches!(result, Err(KeyError::NotADirectory { .. })));
}

#[test]
fn given_owner_only_trusted_file_when_loading_then_keys_are_loaded() {
    let temp = tempfile::tempdir().unwrap();
    let pair = LocalKeyPair::generate();
    write_trusted(temp.path(), &format!("{}\n", pair.public_hex()));

    let trusted = load_trusted_set(temp.path()).unwrap();

    assert_eq!(trusted.len(), 1);
    assert!(trusted.get(&pair.key_ref()).is_some());
}

/// **VALUE**: Verifies a line with invalid UTF-8 is skipped like any other
/// malformed line.
///
/// **WHY THIS MATTERS**: One stray byte in a hand-edited file must not revoke
/// every other trusted key.
///
/// **BUG THIS CATCHES**: Decoding the whole file as UTF-8 before parsing.
#[test]
fn given_invalid_utf8_line_when_loading_trusted_set_then_other_keys_load() {
    // GIVEN: A trusted file with a non-UTF-8 line between two valid keys
    let temp = tempfile::tempdir().unwrap();
    let first = LocalKeyPair::generate();
    let second = LocalKeyPair::generate();
    let mut contents = format!("{}\n", first.public_hex()).into_bytes();
    contents.extend_from_slice(b"\xff\xfe not a key\n");
    contents.extend_from_slice(format!("{}\n", second.public_hex()).as_bytes());
    let path = temp.path().join(TRUSTED_FILE_NAME);
    fs::write(&path, contents).unwrap();
    #[cfg(unix)]
    set_mode(&path, 0o600);

    // WHEN: Loading the trusted set
    let trusted = load_trusted_set(temp.path()).unwrap();

    // THEN: Both valid keys are trusted
    assert_eq!(trusted.len(), 2);
    assert!(trusted.get(&first.key_ref()).is_some());
    assert!(trusted.get(&second.key_ref()).is_some());
}

/// **VALUE**: Verifies a group-writable trusted file is refused outright.
///
/// **WHY THIS MATTERS**: Anyone able to append a line to `trusted` can grant
/// themselves clipboard access. The check has to happen before the contents
/// are even looked at.
///
/// **BUG THIS CATCHES**: Permission checks done after parsing, or only for
/// world bits.
#[cfg(unix)]
#[test]
fn given_group_writable_trusted_file_when_loading_then_permission_error() {
    // GIVEN: A trusted file with a valid key and mode 0620
    let temp = tempfile::tempdir().unwrap();
    let pair = LocalKeyPair::generate();
    write_trusted(temp.path(), &pair.public_hex());
    let path = temp.path().join(TRUSTED_FILE_NAME);
    set_mode(&path, 0o620);

    // WHEN: Loading
    let result = load_trusted_set(temp.path());

    // THEN: Permission error carrying the mode
    match result {
        Err(KeyError::Permissions { mode, .. }) => assert_eq!(mode, 0o620),
        other => panic!("Expected permission error, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn given_policies_when_checking_modes_then_only_forbidden_bits_fail() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("file");
    fs::write(&path, b"x").unwrap();

    set_mode(&path, 0o644);
    assert!(check_key_file(&path, FilePolicy::NoForeignWrite).is_ok());
    let err = check_key_file(&path, FilePolicy::OwnerOnly).unwrap_err();
    assert!(err.is_permission_violation());

    set_mode(&path, 0o664);
    assert!(check_key_file(&path, FilePolicy::NoForeignWrite).is_err());

    set_mode(&path, 0o600);
    assert!(check_key_file(&path, FilePolicy::OwnerOnly).is_ok());
}

#[test]
fn given_directory_when_checking_key_file_then_not_a_regular_file() {
    let temp = tempfile::tempdir().unwrap();

    let result = check_key_file(temp.path(), FilePolicy::OwnerOnly);

    assert!(matches!(result, Err(KeyError::NotARegularFile { .. })));
}

/// **VALUE**: Verifies generate then load yields the same identity.
///
/// **WHY THIS MATTERS**: The client signs with what `load_identity` returns;
/// a mismatch with the public key the user pasted into the server's trusted
/// file makes every call fail.
///
/// **BUG THIS CATCHES**: Writing seed-only private keys, swapped files or
/// wrong file modes.
#[test]
fn given_generated_identity_when_loaded_then_same_key_pair() {
    // GIVEN: A fresh identity in a new nested directory
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("nested").join(".clipgate");
    let generated = generate_identity(&dir).unwrap();

    // WHEN: Loading it back
    let loaded = load_identity(&dir).unwrap();

    // THEN: Same public key, files of the documented sizes
    assert_eq!(generated.public_hex(), loaded.public_hex());
    assert_eq!(fs::read(dir.join(PUBLIC_KEY_FILE_NAME)).unwrap().len(), 32);
    assert_eq!(fs::read(dir.join(PRIVATE_KEY_FILE_NAME)).unwrap().len(), 64);

    #[cfg(unix)]
    {
        assert_eq!(mode_of(&dir), 0o700);
        assert_eq!(mode_of(&dir.join(PUBLIC_KEY_FILE_NAME)), 0o644);
        assert_eq!(mode_of(&dir.join(PRIVATE_KEY_FILE_NAME)), 0o600);
    }
}

/// **VALUE**: Verifies generating into an existing, world-listable key
/// directory tightens it to owner-only.
///
/// **WHY THIS MATTERS**: A `~/.clipgate` created by hand keeps whatever mode
/// it was created with unless it is reset.
///
/// **BUG THIS CATCHES**: Relying on the create mode, which existing
/// directories ignore.
#[cfg(unix)]
#[test]
fn given_existing_open_key_dir_when_generating_identity_then_dir_is_owner_only() {
    // GIVEN: An existing 0755 key directory
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join(".clipgate");
    fs::create_dir(&dir).unwrap();
    set_mode(&dir, 0o755);

    // WHEN: Generating an identity there
    generate_identity(&dir).unwrap();

    // THEN: The directory is owner-only
    assert_eq!(mode_of(&dir), 0o700);
}

#[test]
fn given_existing_identity_when_generating_again_then_pair_is_replaced() {
    let temp = tempfile::tempdir().unwrap();
    let first = generate_identity(temp.path()).unwrap();

    let second = generate_identity(temp.path()).unwrap();

    let loaded = load_identity(temp.path()).unwrap();
    assert_ne!(first.public_hex(), second.public_hex());
    assert_eq!(loaded.public_hex(), second.public_hex());
}

#[test]
fn given_truncated_private_key_when_loading_identity_then_size_error() {
    let temp = tempfile::tempdir().unwrap();
    generate_identity(temp.path()).unwrap();
    let private_path = temp.path().join(PRIVATE_KEY_FILE_NAME);
    let bytes = fs::read(&private_path).unwrap();
    fs::write(&private_path, &bytes[..32]).unwrap();

    let result = load_identity(temp.path());

    match result {
        Err(KeyError::Size {
            expected, actual, ..
        }) => {
            assert_eq!(expected, 64);
            assert_eq!(actual, 32);
        }
        other => panic!("Expected size error, got {other:?}"),
    }
}

#[test]
fn given_public_key_of_other_pair_when_loading_identity_then_invalid() {
    let temp = tempfile::tempdir().unwrap();
    generate_identity(temp.path()).unwrap();
    let other = LocalKeyPair::generate();
    fs::write(
        temp.path().join(PUBLIC_KEY_FILE_NAME),
        other.public_key().as_bytes(),
    )
    .unwrap();

    let result = load_identity(temp.path());

    assert!(matches!(result, Err(KeyError::Invalid { .. })));
}

#[test]
fn given_key_pair_when_debug_formatted_then_private_key_is_redacted() {
    let pair = LocalKeyPair::generate();
    let private_hex = hex::encode(pair.private_bytes().expose());

    let debug = format!("{pair:?}");

    assert!(debug.contains("[REDACTED]"));
    assert!(!debug.contains(&private_hex[..16]));
}
