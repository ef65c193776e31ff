use crate::cli::{Cli, Command, ServeArgs};
use crate::commands::serve::resolve_config;

use remote_core::config::ServiceConfig;
use remote_core::service::LineEnding;

use clap::Parser;

fn serve_args(args: &[&str]) -> ServeArgs {
    let argv = ["clipgate", "serve"].into_iter().chain(args.iter().copied());
    match Cli::try_parse_from(argv).unwrap().command {
        Command::Serve(args) => args,
        other => panic!("Expected serve, got {other:?}"),
    }
}

/// **VALUE**: Verifies explicit flags win over the compact parameter string,
/// and both win over the loaded config.
///
/// **WHY THIS MATTERS**: Users combine a saved string with one-off flags; the
/// more specific setting must be the one that takes effect.
///
/// **BUG THIS CATCHES**: Applying the parameter string after the flags.
#[test]
fn given_params_and_flags_when_applied_then_flags_win() {
    // GIVEN: A parameter string and a conflicting --port
    let args = serve_args(&["9100;10.0.0.0/8;crlf", "--port", "9200", "--plain"]);

    // WHEN: Applied over defaults
    let mut config = ServiceConfig::default();
    args.apply(&mut config);

    // THEN: Flag port, string allow-list and line ending, plain mode
    assert_eq!(config.port, 9200);
    assert_eq!(config.allow, "10.0.0.0/8");
    assert_eq!(config.line_ending, Some(LineEnding::Crlf));
    assert!(!config.signed);
}

#[test]
fn given_no_overrides_when_applied_then_config_unchanged() {
    let args = serve_args(&[]);

    let mut config = ServiceConfig::default();
    args.apply(&mut config);

    assert_eq!(config, ServiceConfig::default());
}

#[test]
fn given_malformed_params_when_parsing_then_rejected() {
    let result = Cli::try_parse_from(["clipgate", "serve", "1;2;3;4"]);
    assert!(result.is_err());

    let result = Cli::try_parse_from(["clipgate", "serve", "notaport"]);
    assert!(result.is_err());
}

#[test]
fn given_unknown_line_ending_when_parsing_then_rejected() {
    let result = Cli::try_parse_from(["clipgate", "copy", "--line-ending", "cr", "text"]);
    assert!(result.is_err());
}

#[test]
fn given_copy_without_server_when_parsing_then_default_target_is_used() {
    let cli = Cli::try_parse_from(["clipgate", "--debug", "copy", "hello"]).unwrap();

    assert!(cli.debug);
    match cli.command {
        Command::Copy {
            target,
            text,
            line_ending,
        } => {
            assert_eq!(target.server, "127.0.0.1:2850");
            assert!(!target.plain);
            assert_eq!(text.as_deref(), Some("hello"));
            assert_eq!(line_ending, None);
        }
        other => panic!("Expected copy, got {other:?}"),
    }
}

#[test]
fn given_open_with_flags_when_parsing_then_fields_are_set() {
    let cli = Cli::try_parse_from([
        "clipgate",
        "open",
        "--server",
        "10.0.0.2:2850",
        "--plain",
        "--translate-loopback",
        "http://127.0.0.1:3000/",
    ])
    .unwrap();

    match cli.command {
        Command::Open {
            target,
            translate_loopback,
            uri,
        } => {
            assert_eq!(target.server, "10.0.0.2:2850");
            assert!(target.plain);
            assert!(translate_loopback);
            assert_eq!(uri, "http://127.0.0.1:3000/");
        }
        other => panic!("Expected open, got {other:?}"),
    }
}

#[test]
fn given_save_flag_when_resolving_then_config_is_persisted() {
    // GIVEN: An empty config directory and overrides with --save
    let temp = tempfile::tempdir().unwrap();
    let args = serve_args(&["--allow", "192.168.1.0/24", "--idle-timeout", "0", "--save"]);

    // WHEN: Resolving
    let config = resolve_config(&args, temp.path()).unwrap();

    // THEN: The next load sees the same values
    let reloaded = ServiceConfig::load(temp.path()).unwrap();
    assert_eq!(reloaded, config);
    assert_eq!(reloaded.allow, "192.168.1.0/24");
    assert_eq!(reloaded.idle_timeout_secs, 0);
}

#[test]
fn given_invalid_allow_with_save_when_resolving_then_error_and_nothing_written() {
    let temp = tempfile::tempdir().unwrap();
    let args = serve_args(&["--allow", "10.0.0.0/33", "--save"]);

    let result = resolve_config(&args, temp.path());

    assert!(result.is_err());
    assert!(!temp.path().join("config.json").exists());
}
