use crate::helpers::{
    FakeDesktop, connect_raw, is_connection_closed, send_raw, start_test_server, test_config,
    trusting, write_trusted_file,
};

use remote_core::client::RemoteClient;
use remote_core::error::{KeyError, ServiceError};
use remote_core::keys::{LocalKeyPair, TRUSTED_FILE_NAME};
use remote_core::proto::rpc_call::Call;
use remote_core::proto::{CopyArgs, RpcCall, RpcReply};
use remote_core::server::start_service;
use remote_core::transport::{FrameSigner, TAG_LENGTH};

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use prost::Message as ProstMessage;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

fn copy_call(seq: u64, text: &str) -> Vec<u8> {
    RpcCall {
        seq,
        call: Some(Call::Copy(CopyArgs::new(text, None))),
    }
    .encode_to_vec()
}

#[tokio::test]
async fn given_trusted_client_when_copying_then_clipboard_is_written() {
    // GIVEN: A signed server trusting the client's key
    let identity = Arc::new(LocalKeyPair::generate());
    let desktop = FakeDesktop::new();
    let server = start_test_server(&test_config(true), trusting(&[&identity]), desktop.clone()).await;

    // WHEN: The client copies over signed frames
    let signer = FrameSigner::new(Arc::clone(&identity));
    let mut client = RemoteClient::connect(server.addr, Some(signer)).await.unwrap();
    client.copy("signed text", None).await.unwrap();
    let pasted = client.paste().await.unwrap();

    // THEN: The call went through
    assert_eq!(desktop.clipboard(), "signed text");
    assert_eq!(pasted, "signed text");

    server.stop().await.unwrap();
}

/// **VALUE**: Verifies a call signed by an unknown key ends the connection
/// without a reply and without touching the desktop.
///
/// **WHY THIS MATTERS**: An unauthenticated peer must learn nothing and
/// change nothing.
///
/// **BUG THIS CATCHES**: Error replies that leak why authentication failed,
/// or dispatching before verification.
#[tokio::test]
async fn given_unknown_key_when_calling_then_connection_closes_without_reply() {
    // GIVEN: A server trusting someone else
    let friend = LocalKeyPair::generate();
    let stranger = Arc::new(LocalKeyPair::generate());
    let desktop = FakeDesktop::new();
    let server = start_test_server(&test_config(true), trusting(&[&friend]), desktop.clone()).await;

    // WHEN: The stranger calls
    let mut client = RemoteClient::connect(server.addr, Some(FrameSigner::new(stranger)))
        .await
        .unwrap();
    let result = client.copy("intrusion", None).await;

    // THEN: Closed, nothing written
    let err = result.unwrap_err();
    assert!(err.is_closed(), "Expected closed connection, got {err}");
    assert_eq!(desktop.clipboard(), "");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn given_corrupted_signature_when_calling_then_connection_closes_without_reply() {
    let identity = Arc::new(LocalKeyPair::generate());
    let desktop = FakeDesktop::new();
    let server = start_test_server(&test_config(true), trusting(&[&identity]), desktop.clone()).await;
    let signer = FrameSigner::new(Arc::clone(&identity));
    let mut ws = connect_raw(server.addr).await;

    let mut frame = signer.seal(&copy_call(1, "tampered"));
    frame[TAG_LENGTH + 32] ^= 0x80;
    send_raw(&mut ws, frame).await;

    assert!(is_connection_closed(&mut ws).await);
    assert_eq!(desktop.clipboard(), "");

    server.stop().await.unwrap();
}

/// **VALUE**: Verifies every frame is verified, not just the first.
///
/// **WHY THIS MATTERS**: Pinning the identity to the connection after one
/// good frame would let anything follow it.
///
/// **BUG THIS CATCHES**: Authenticate-once session logic.
#[tokio::test]
async fn given_valid_then_unsigned_frame_when_sent_then_second_ends_session() {
    // GIVEN: An authenticated first call that succeeds
    let identity = Arc::new(LocalKeyPair::generate());
    let desktop = FakeDesktop::new();
    let server = start_test_server(&test_config(true), trusting(&[&identity]), desktop.clone()).await;
    let signer = FrameSigner::new(Arc::clone(&identity));
    let mut ws = connect_raw(server.addr).await;

    send_raw(&mut ws, signer.seal(&copy_call(1, "first"))).await;
    let reply = match ws.next().await {
        Some(Ok(Message::Binary(data))) => RpcReply::decode(&data[..]).unwrap(),
        other => panic!("Expected reply, got {other:?}"),
    };
    assert_eq!(reply.seq, 1);
    assert_eq!(reply.error, None);

    // WHEN: The next frame is the bare call without an envelope
    send_raw(&mut ws, copy_call(2, "second")).await;

    // THEN: Session ends, second call never reached the desktop
    assert!(is_connection_closed(&mut ws).await);
    assert_eq!(desktop.clipboard(), "first");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn given_missing_key_dir_when_starting_service_then_returns_without_listening() {
    let temp = tempfile::tempdir().unwrap();
    let config = remote_core::config::ServiceConfig {
        key_dir: Some(temp.path().join("absent")),
        ..test_config(true)
    };

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        start_service(config, FakeDesktop::new(), CancellationToken::new()),
    )
    .await
    .expect("start_service should return at once");

    assert!(result.is_ok());
}

#[tokio::test]
async fn given_trusted_file_without_keys_when_starting_service_then_returns_without_listening() {
    let temp = tempfile::tempdir().unwrap();
    write_trusted_file(temp.path(), &[String::from("# nobody yet")]);
    let config = remote_core::config::ServiceConfig {
        key_dir: Some(temp.path().to_path_buf()),
        ..test_config(true)
    };

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        start_service(config, FakeDesktop::new(), CancellationToken::new()),
    )
    .await
    .expect("start_service should return at once");

    assert!(result.is_ok());
}

#[cfg(unix)]
#[tokio::test]
async fn given_group_writable_trusted_file_when_starting_service_then_permission_error() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempfile::tempdir().unwrap();
    let identity = LocalKeyPair::generate();
    write_trusted_file(temp.path(), &[identity.public_hex()]);
    std::fs::set_permissions(
        temp.path().join(TRUSTED_FILE_NAME),
        std::fs::Permissions::from_mode(0o660),
    )
    .unwrap();
    let config = remote_core::config::ServiceConfig {
        key_dir: Some(temp.path().to_path_buf()),
        ..test_config(true)
    };

    let result = start_service(config, FakeDesktop::new(), CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(ServiceError::Keys(KeyError::Permissions { .. }))
    ));
}

/// **VALUE**: Verifies the collaborator entry point serves from a key
/// directory and stops on cancellation.
///
/// **WHY THIS MATTERS**: This is exactly what the host application runs.
///
/// **BUG THIS CATCHES**: Cancellation surfacing as an error, or trust loaded
/// from the wrong place.
#[tokio::test]
async fn given_key_dir_with_trusted_key_when_service_started_then_serves_until_cancelled() {
    // GIVEN: A key directory trusting the test identity, on a fixed port
    let temp = tempfile::tempdir().unwrap();
    let identity = Arc::new(LocalKeyPair::generate());
    write_trusted_file(temp.path(), &[identity.public_hex()]);

    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = probe.local_addr().unwrap().port();
    drop(probe);

    let config = remote_core::config::ServiceConfig {
        port,
        key_dir: Some(temp.path().to_path_buf()),
        ..test_config(true)
    };
    let desktop = FakeDesktop::new();
    let cancel = CancellationToken::new();
    let service = tokio::spawn(start_service(config, desktop.clone(), cancel.clone()));

    // WHEN: A trusted client copies, then the service is cancelled
    let mut client = None;
    for _ in 0..50 {
        match RemoteClient::connect(
            format!("127.0.0.1:{port}"),
            Some(FrameSigner::new(Arc::clone(&identity))),
        )
        .await
        {
            Ok(connected) => {
                client = Some(connected);
                break;
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
    let mut client = client.expect("Service never started listening");
    client.copy("via start_service", None).await.unwrap();
    cancel.cancel();

    // THEN: The call landed and the service stopped cleanly
    assert_eq!(desktop.clipboard(), "via start_service");
    let stopped = tokio::time::timeout(Duration::from_secs(5), service)
        .await
        .expect("Service did not stop")
        .unwrap();
    assert!(stopped.is_ok());
}
