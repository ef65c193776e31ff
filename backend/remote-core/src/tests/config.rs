use crate::config::{ServiceConfig, ServiceParams};
use crate::error::ConfigError;
use crate::service::LineEnding;
use crate::{DEFAULT_ALLOW, DEFAULT_PORT};

use std::fs;
use std::time::Duration;

#[test]
fn given_no_config_file_when_loading_then_defaults_are_used() {
    let temp = tempfile::tempdir().unwrap();

    let config = ServiceConfig::load(temp.path()).unwrap();

    assert_eq!(config, ServiceConfig::default());
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.allow, DEFAULT_ALLOW);
    assert!(config.signed);
    assert_eq!(config.idle_timeout(), Some(Duration::from_secs(300)));
}

#[test]
fn given_saved_config_when_loaded_then_values_survive() {
    // GIVEN: A non-default configuration saved to disk
    let temp = tempfile::tempdir().unwrap();
    let config = ServiceConfig {
        port: 4242,
        allow: String::from("10.0.0.0/8"),
        line_ending: Some(LineEnding::Crlf),
        signed: false,
        idle_timeout_secs: 0,
        ..ServiceConfig::default()
    };
    config.save(temp.path()).unwrap();

    // WHEN: Loading it back
    let loaded = ServiceConfig::load(temp.path()).unwrap();

    // THEN: Everything survives, the temp file is gone
    assert_eq!(loaded, config);
    assert_eq!(loaded.idle_timeout(), None);
    assert!(!temp.path().join("config.json.tmp").exists());
}

#[test]
fn given_partial_json_when_loaded_then_missing_fields_take_defaults() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(
        temp.path().join("config.json"),
        r#"{ "port": 9000, "line_ending": "lf" }"#,
    )
    .unwrap();

    let config = ServiceConfig::load(temp.path()).unwrap();

    assert_eq!(config.port, 9000);
    assert_eq!(config.line_ending, Some(LineEnding::Lf));
    assert_eq!(config.allow, DEFAULT_ALLOW);
    assert!(config.signed);
}

#[test]
fn given_corrupt_json_when_loaded_then_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("config.json"), "{ not json").unwrap();

    let result = ServiceConfig::load(temp.path());

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

/// **VALUE**: Verifies a bad allow-list cannot be persisted or loaded.
///
/// **WHY THIS MATTERS**: The allow-list fails closed at service start; a
/// config that cannot start should be caught when it is written.
///
/// **BUG THIS CATCHES**: Validation that skips the allow-list.
#[test]
fn given_invalid_values_when_validating_then_validation_error() {
    let bad_allow = ServiceConfig {
        allow: String::from("10.0.0.0/99"),
        ..ServiceConfig::default()
    };
    let bad_version = ServiceConfig {
        version: 7,
        ..ServiceConfig::default()
    };
    let bad_bind = ServiceConfig {
        bind_address: String::from("localhost"),
        ..ServiceConfig::default()
    };
    let zero_port = ServiceConfig {
        port: 0,
        ..ServiceConfig::default()
    };

    for config in [bad_allow, bad_version, bad_bind, zero_port] {
        assert!(
            matches!(config.validate(), Err(ConfigError::ValidationError { .. })),
            "{config:?}"
        );
    }
}

#[test]
fn given_key_dir_override_when_resolving_then_override_wins() {
    let temp = tempfile::tempdir().unwrap();
    let config = ServiceConfig {
        key_dir: Some(temp.path().to_path_buf()),
        ..ServiceConfig::default()
    };

    assert_eq!(config.resolved_key_dir().unwrap(), temp.path());
}

#[test]
fn given_full_params_when_parsed_then_all_parts_are_set() {
    let params: ServiceParams = "2851;10.0.0.0/8,::1;crlf".parse().unwrap();

    assert_eq!(params.port, Some(2851));
    assert_eq!(params.allow.as_deref(), Some("10.0.0.0/8,::1"));
    assert_eq!(params.line_ending, Some(LineEnding::Crlf));
}

#[test]
fn given_partial_params_when_parsed_then_missing_parts_are_none() {
    let port_only: ServiceParams = "2850".parse().unwrap();
    let le_only: ServiceParams = ";;LF".parse().unwrap();
    let empty: ServiceParams = "".parse().unwrap();

    assert_eq!(port_only.port, Some(2850));
    assert_eq!(port_only.allow, None);
    assert_eq!(le_only.line_ending, Some(LineEnding::Lf));
    assert_eq!(le_only.port, None);
    assert!(empty.is_empty());
}

#[test]
fn given_malformed_params_when_parsed_then_params_error() {
    for input in ["1;2;3;4", "port", "70000", ";not-an-address", ";;cr"] {
        assert!(
            matches!(
                input.parse::<ServiceParams>(),
                Err(ConfigError::ParamsError { .. })
            ),
            "{input}"
        );
    }
}

#[test]
fn given_params_when_displayed_then_parse_back_to_same_value() {
    let inputs = ["2850", "2850;127.0.0.1", ";;crlf", "1;10.0.0.0/8;lf", ";::1"];

    for input in inputs {
        let params: ServiceParams = input.parse().unwrap();
        assert_eq!(params.to_string(), input);
    }
}

#[test]
fn given_params_when_applied_then_only_set_parts_override() {
    let mut config = ServiceConfig::default();
    let params: ServiceParams = ";192.168.0.0/16".parse().unwrap();

    config.apply_params(&params);

    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.allow, "192.168.0.0/16");
    assert_eq!(config.line_ending, None);
}
