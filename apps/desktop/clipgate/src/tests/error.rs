// Unit tests for error module
// AppError must stay serialisable for a front end

use crate::error::AppError;

use common::ErrorLocation;

use remote_core::error::ConfigError;

use std::panic::Location;

/// **VALUE**: Tests that errors can be serialized.
///
/// **WHY THIS MATTERS**: A tray or web front end receives errors as JSON. If
/// serialization breaks, it only sees opaque failures.
///
/// **BUG THIS CATCHES**: Would catch if someone removes the `#[derive(Serialize)]`
/// or adds a non-serializable field.
#[test]
fn given_app_error_when_serialized_then_succeeds() {
    // GIVEN: An AppError
    let err = AppError::NotRunning {
        message: String::from("Test"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Serializing to JSON
    let result = serde_json::to_string(&err);

    // THEN: Should succeed and carry the variant and message
    let json = result.expect("Error should be serializable");
    assert!(
        json.contains("NotRunning"),
        "JSON should contain variant name"
    );
    assert!(json.contains("Test"), "JSON should contain message");
}

#[test]
fn given_core_error_when_converted_then_message_is_kept() {
    let core = ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason: String::from("port cannot be 0"),
    };

    let err = AppError::from(core);

    match err {
        AppError::Core { message, .. } => assert!(message.contains("port cannot be 0")),
        other => panic!("Expected Core error, got {other:?}"),
    }
}
