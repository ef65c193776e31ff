use crate::helpers::{FakeDesktop, connect_raw, is_connection_closed, start_test_server, test_config};

use remote_core::client::RemoteClient;
use remote_core::config::ServiceConfig;
use remote_core::error::ServiceError;
use remote_core::server::RemoteControlServer;
use remote_core::transport::SessionTransport;

use std::time::Duration;

#[tokio::test]
async fn given_running_server_when_cancelled_then_run_returns_ok() {
    // GIVEN: A running server
    let server =
        start_test_server(&test_config(false), SessionTransport::Plain, FakeDesktop::new()).await;

    // WHEN: Cancelling
    let result = tokio::time::timeout(Duration::from_secs(5), server.stop())
        .await
        .expect("Server did not stop");

    // THEN: Normal shutdown, not an error
    assert!(result.is_ok());
}

#[tokio::test]
async fn given_port_zero_when_bound_then_actual_port_is_reported() {
    let server = RemoteControlServer::bind(
        &test_config(false),
        SessionTransport::Plain,
        FakeDesktop::new(),
    )
    .await
    .unwrap();

    assert_ne!(server.local_addr().port(), 0);
    assert!(server.local_addr().ip().is_loopback());
}

/// **VALUE**: Verifies peers outside the allow-list never get a session.
///
/// **WHY THIS MATTERS**: The allow-list is the outer wall in both variants;
/// the plain variant has nothing else.
///
/// **BUG THIS CATCHES**: Checking the allow-list after the WebSocket upgrade,
/// or not at all.
#[tokio::test]
async fn given_peer_outside_allow_list_when_connecting_then_dropped() {
    // GIVEN: A server that only allows a foreign network
    let config = ServiceConfig {
        allow: String::from("10.0.0.0/8"),
        ..test_config(false)
    };
    let desktop = FakeDesktop::new();
    let server = start_test_server(&config, SessionTransport::Plain, desktop.clone()).await;

    // WHEN: Connecting from loopback
    let result = RemoteClient::connect(server.addr, None).await;

    // THEN: The handshake never completes
    assert!(result.is_err());
    server.stop().await.unwrap();
}

#[tokio::test]
async fn given_bad_allow_list_when_binding_then_fails_closed() {
    let config = ServiceConfig {
        allow: String::from("127.0.0.1,not-an-address"),
        ..test_config(false)
    };

    let result = RemoteControlServer::bind(&config, SessionTransport::Plain, FakeDesktop::new()).await;

    assert!(matches!(result, Err(ServiceError::AllowList(_))));
}

#[tokio::test]
async fn given_port_in_use_when_binding_then_bind_error() {
    let first = RemoteControlServer::bind(
        &test_config(false),
        SessionTransport::Plain,
        FakeDesktop::new(),
    )
    .await
    .unwrap();
    let config = ServiceConfig {
        port: first.local_addr().port(),
        ..test_config(false)
    };

    let result = RemoteControlServer::bind(&config, SessionTransport::Plain, FakeDesktop::new()).await;

    assert!(matches!(result, Err(ServiceError::Bind { .. })));
}

#[tokio::test]
async fn given_idle_timeout_when_session_stays_silent_then_server_closes_it() {
    // GIVEN: A one-second idle timeout
    let config = ServiceConfig {
        idle_timeout_secs: 1,
        ..test_config(false)
    };
    let server = start_test_server(&config, SessionTransport::Plain, FakeDesktop::new()).await;
    let mut ws = connect_raw(server.addr).await;

    // WHEN/THEN: Saying nothing gets the connection closed
    assert!(is_connection_closed(&mut ws).await);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn given_cancelled_server_when_session_in_flight_then_session_keeps_working() {
    let desktop = FakeDesktop::new();
    let server =
        start_test_server(&test_config(false), SessionTransport::Plain, desktop.clone()).await;
    let mut client = RemoteClient::connect(server.addr, None).await.unwrap();

    server.stop().await.unwrap();

    client.copy("after stop", None).await.unwrap();
    assert_eq!(desktop.clipboard(), "after stop");
}
