use crate::helpers::{RecordingDesktop, loopback_config};

use clipgate::cli::{KeygenArgs, TargetArgs};
use clipgate::commands::{keygen, remote};

use remote_core::keys::{TrustedKeys, load_identity};
use remote_core::server::RemoteControlServer;
use remote_core::service::LineEnding;
use remote_core::transport::{FrameVerifier, SessionTransport};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

async fn serve(transport: SessionTransport, desktop: Arc<RecordingDesktop>) -> (SocketAddr, CancellationToken) {
    let server = RemoteControlServer::bind(&loopback_config(true), transport, desktop)
        .await
        .expect("Failed to bind test server");
    let addr = server.local_addr();
    let cancel = CancellationToken::new();
    tokio::spawn(server.run(cancel.clone()));
    (addr, cancel)
}

/// **VALUE**: Verifies the key generated by `keygen` is the one `copy` signs
/// with, end to end against a server trusting it.
///
/// **WHY THIS MATTERS**: This is the whole setup a user performs: generate,
/// trust on the server, call.
///
/// **BUG THIS CATCHES**: Would catch the CLI loading keys from a different
/// place than keygen writes them.
#[tokio::test]
async fn given_generated_key_trusted_by_server_when_copying_then_clipboard_is_set() {
    // GIVEN: A fresh key pair and a server trusting its public key
    let temp = tempfile::tempdir().unwrap();
    let key_dir = temp.path().join("keys");
    let identity = keygen::run(&KeygenArgs {
        key_dir: Some(key_dir.clone()),
        force: false,
    })
    .unwrap();

    let mut trusted = TrustedKeys::new();
    trusted.insert(identity.public_key());
    let desktop = RecordingDesktop::new();
    let (addr, cancel) = serve(
        SessionTransport::Signed(FrameVerifier::new(Arc::new(trusted))),
        desktop.clone(),
    )
    .await;

    let target = TargetArgs {
        server: addr.to_string(),
        plain: false,
        key_dir: Some(key_dir),
    };

    // WHEN: Copying, then pasting through the CLI commands
    remote::copy(&target, Some(String::from("a\r\nb")), Some(LineEnding::Lf))
        .await
        .unwrap();
    let pasted = remote::paste(&target).await.unwrap();

    // THEN: Both went through the signed path
    assert_eq!(desktop.clipboard(), "a\nb");
    assert_eq!(pasted, "a\nb");

    cancel.cancel();
}

#[tokio::test]
async fn given_plain_target_when_opening_then_uri_is_handed_over() {
    let desktop = RecordingDesktop::new();
    let (addr, cancel) = serve(SessionTransport::Plain, desktop.clone()).await;
    let target = TargetArgs {
        server: addr.to_string(),
        plain: true,
        key_dir: None,
    };

    remote::open(&target, String::from("https://example.com/"), true)
        .await
        .unwrap();

    assert_eq!(
        *desktop.opened.lock().unwrap(),
        vec![String::from("https://example.com/")]
    );
    cancel.cancel();
}

#[tokio::test]
async fn given_missing_key_dir_when_calling_signed_then_error_before_connecting() {
    let temp = tempfile::tempdir().unwrap();
    let target = TargetArgs {
        server: String::from("127.0.0.1:9"),
        plain: false,
        key_dir: Some(temp.path().join("absent")),
    };

    let result = remote::paste(&target).await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("absent"), "{err}");
}

#[test]
fn given_existing_key_when_generating_without_force_then_refused() {
    let temp = tempfile::tempdir().unwrap();
    let args = KeygenArgs {
        key_dir: Some(temp.path().to_path_buf()),
        force: false,
    };
    let first = keygen::run(&args).unwrap();

    let refused = keygen::run(&args);
    let replaced = keygen::run(&KeygenArgs {
        force: true,
        ..args.clone()
    })
    .unwrap();

    assert!(refused.is_err());
    assert_ne!(first.public_hex(), replaced.public_hex());
    assert_eq!(
        load_identity(temp.path()).unwrap().public_hex(),
        replaced.public_hex()
    );
}
