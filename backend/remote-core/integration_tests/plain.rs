use crate::helpers::{
    FakeDesktop, connect_raw, is_connection_closed, send_raw, start_test_server, test_config,
};

use remote_core::client::RemoteClient;
use remote_core::proto::RpcCall;
use remote_core::service::LineEnding;
use remote_core::transport::SessionTransport;

use std::sync::atomic::Ordering;
use std::time::Duration;

use prost::Message as ProstMessage;

/// **VALUE**: Verifies the plain variant end to end: copy, paste and open
/// over a real socket.
///
/// **WHY THIS MATTERS**: This is the whole service as a trusted LAN peer sees
/// it; every layer from accept to desktop is involved.
///
/// **BUG THIS CATCHES**: Framing, codec or dispatch mistakes that unit tests
/// of single layers cannot see.
#[tokio::test]
async fn given_plain_server_when_client_copies_and_pastes_then_text_round_trips() {
    // GIVEN: A plain server and a connected client
    let desktop = FakeDesktop::new();
    let server =
        start_test_server(&test_config(false), SessionTransport::Plain, desktop.clone()).await;
    let mut client = RemoteClient::connect(server.addr, None).await.unwrap();

    // WHEN: Copying with a CRLF policy, then pasting
    client
        .copy("line one\nline two", Some(LineEnding::Crlf))
        .await
        .unwrap();
    let pasted = client.paste().await.unwrap();

    // THEN: The clipboard holds the converted text
    assert_eq!(desktop.clipboard(), "line one\r\nline two");
    assert_eq!(pasted, "line one\r\nline two");

    client.close().await.unwrap();
    server.stop().await.unwrap();
}

#[tokio::test]
async fn given_loopback_uri_when_opened_with_translation_then_observed_address_is_used() {
    let desktop = FakeDesktop::new();
    let server =
        start_test_server(&test_config(false), SessionTransport::Plain, desktop.clone()).await;
    let mut client = RemoteClient::connect(server.addr, None).await.unwrap();

    client.open("http://[::1]:8080/page", true).await.unwrap();
    client.open("http://[::1]:8080/page", false).await.unwrap();

    // The test client connects from 127.0.0.1.
    assert_eq!(
        desktop.opened(),
        vec![
            String::from("http://127.0.0.1:8080/page"),
            String::from("http://[::1]:8080/page"),
        ]
    );

    server.stop().await.unwrap();
}

/// **VALUE**: Verifies two concurrent copies in the gated plain variant never
/// run at the same time.
///
/// **WHY THIS MATTERS**: The rendezvous gate is the only thing serialising
/// calls from different connections in the plain variant.
///
/// **BUG THIS CATCHES**: Sessions dispatching directly, or the gate being
/// released before the desktop call returns.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn given_concurrent_clients_when_copying_then_writes_never_overlap() {
    // GIVEN: A plain server whose clipboard writes are slow
    let desktop = FakeDesktop::slow(Duration::from_millis(50));
    let server =
        start_test_server(&test_config(false), SessionTransport::Plain, desktop.clone()).await;

    // WHEN: Four clients copy at the same time, twice each
    let mut handles = Vec::new();
    for index in 0..4 {
        let addr = server.addr;
        handles.push(tokio::spawn(async move {
            let mut client = RemoteClient::connect(addr, None).await.unwrap();
            for round in 0..2 {
                client
                    .copy(format!("client {index} round {round}"), None)
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // THEN: No two writes were ever in progress together
    assert_eq!(desktop.overlapping_writes.load(Ordering::SeqCst), 0);
    assert!(desktop.clipboard().starts_with("client "));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn given_undecodable_call_when_received_then_connection_closes_without_reply() {
    let desktop = FakeDesktop::new();
    let server =
        start_test_server(&test_config(false), SessionTransport::Plain, desktop.clone()).await;
    let mut ws = connect_raw(server.addr).await;

    send_raw(&mut ws, vec![0xff, 0xff, 0xff, 0xff]).await;

    assert!(is_connection_closed(&mut ws).await);
    server.stop().await.unwrap();
}

#[tokio::test]
async fn given_call_without_operation_when_received_then_connection_closes_without_reply() {
    let desktop = FakeDesktop::new();
    let server =
        start_test_server(&test_config(false), SessionTransport::Plain, desktop.clone()).await;
    let mut ws = connect_raw(server.addr).await;

    let empty = RpcCall { seq: 1, call: None };
    send_raw(&mut ws, empty.encode_to_vec()).await;

    assert!(is_connection_closed(&mut ws).await);
    server.stop().await.unwrap();
}

#[tokio::test]
async fn given_locked_session_when_client_copies_then_remote_error_and_clipboard_untouched() {
    let desktop = FakeDesktop::new();
    desktop.locked.store(true, Ordering::SeqCst);
    let server =
        start_test_server(&test_config(false), SessionTransport::Plain, desktop.clone()).await;
    let mut client = RemoteClient::connect(server.addr, None).await.unwrap();

    let result = client.copy("while away", None).await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("desktop session is locked"), "{err}");
    assert_eq!(desktop.clipboard(), "");

    // The session survives application errors.
    desktop.locked.store(false, Ordering::SeqCst);
    client.copy("back again", None).await.unwrap();
    assert_eq!(desktop.clipboard(), "back again");

    server.stop().await.unwrap();
}
