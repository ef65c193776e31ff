use crate::{RedactError, SecretBytes};

/// **VALUE**: Private key bytes must never reach a log line.
///
/// **BUG THIS CATCHES**: Would catch a derived `Debug`/`Display` that prints the
/// raw array.
#[test]
fn given_secret_when_formatted_then_value_is_redacted() {
    // GIVEN: A secret with a recognisable byte pattern
    let secret = SecretBytes::new([0xABu8; 8]);

    // WHEN: Formatting with Debug and Display
    let debug = format!("{:?}", secret);
    let display = format!("{}", secret);

    // THEN: Neither contains the bytes
    assert!(debug.contains("REDACTED"));
    assert!(display.contains("REDACTED"));
    assert!(!debug.contains("171"));
    assert!(!debug.to_lowercase().contains("ab"));
}

#[test]
fn given_secret_when_serialized_then_fails() {
    let secret = SecretBytes::new([1u8; 4]);

    let result = serde_json::to_string(&secret);

    assert!(result.is_err(), "SecretBytes must refuse serialization");
}

#[test]
fn given_wrong_length_slice_when_from_slice_then_length_error() {
    // GIVEN: 63 bytes for a 64-byte secret
    let bytes = vec![7u8; 63];

    // WHEN
    let result = SecretBytes::<64>::from_slice(&bytes);

    // THEN
    match result {
        Err(RedactError::Length {
            expected, actual, ..
        }) => {
            assert_eq!(expected, 64);
            assert_eq!(actual, 63);
        }
        other => panic!("Expected length error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn given_exact_slice_when_from_slice_then_exposes_same_bytes() {
    let bytes: Vec<u8> = (0u8..32).collect();

    let secret = SecretBytes::<32>::from_slice(&bytes).expect("length matches");

    assert_eq!(&secret.expose()[..], &bytes[..]);
    assert_eq!(secret.len(), 32);
}
