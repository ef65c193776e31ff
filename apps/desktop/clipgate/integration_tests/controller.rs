use crate::helpers::{RecordingDesktop, loopback_config};

use clipgate::controller::ServiceController;
use clipgate::error::AppError;

use remote_core::config::ServiceConfig;

use std::time::Duration;

// ============================================================================
// Integration tests for ServiceController against the real service
// ============================================================================

/// **VALUE**: Verifies the start/stop cycle a tray menu drives.
///
/// **WHY THIS MATTERS**: Toggling remote control must never leave a second
/// listener behind or report a stopped service as running.
///
/// **BUG THIS CATCHES**: Would catch a start that silently replaces a live
/// run, or a stop that returns before the accept loop has ended.
#[tokio::test]
async fn given_started_controller_when_stopped_then_no_longer_running() {
    // GIVEN: A controller serving a plain loopback config
    let controller = ServiceController::new(RecordingDesktop::new());
    controller.start(loopback_config(false)).await.unwrap();
    assert!(controller.is_running().await);

    // WHEN: Starting again, then stopping
    let second = controller.start(loopback_config(false)).await;
    let stopped = tokio::time::timeout(Duration::from_secs(5), controller.stop())
        .await
        .expect("Stop should complete within 5 seconds");

    // THEN: Second start refused, stop clean, nothing running
    assert!(matches!(second, Err(AppError::AlreadyRunning { .. })));
    assert!(stopped.is_ok(), "Stop should succeed: {stopped:?}");
    assert!(!controller.is_running().await);
}

#[tokio::test]
async fn given_idle_controller_when_stopped_then_not_running_error() {
    let controller = ServiceController::new(RecordingDesktop::new());

    let result = controller.stop().await;

    assert!(matches!(result, Err(AppError::NotRunning { .. })));
}

/// **VALUE**: Verifies a signed config without a key directory ends on its own
/// and reports success.
///
/// **WHY THIS MATTERS**: Remote control is opt-in; a host that never created
/// keys must start normally without listening.
///
/// **BUG THIS CATCHES**: Would catch treating "not configured" as a failure,
/// or `finished()` never resolving.
#[tokio::test]
async fn given_missing_key_dir_when_started_then_finishes_without_error() {
    // GIVEN: Signed mode pointing at a directory that does not exist
    let temp = tempfile::tempdir().unwrap();
    let config = ServiceConfig {
        key_dir: Some(temp.path().join("absent")),
        ..loopback_config(true)
    };
    let controller = ServiceController::new(RecordingDesktop::new());

    // WHEN: Starting
    controller.start(config).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), controller.finished())
        .await
        .expect("Service should end on its own");

    // THEN: Not running, stop reports the clean outcome
    assert!(!controller.is_running().await);
    assert!(controller.stop().await.is_ok());
}

#[tokio::test]
async fn given_bad_bind_address_when_started_then_stop_reports_core_error() {
    let config = ServiceConfig {
        bind_address: String::from("not-an-address"),
        ..loopback_config(false)
    };
    let controller = ServiceController::new(RecordingDesktop::new());

    controller.start(config).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), controller.finished())
        .await
        .expect("Service should fail on its own");

    let result = controller.stop().await;
    assert!(matches!(result, Err(AppError::Core { .. })), "{result:?}");
}

#[tokio::test]
async fn given_run_that_ended_when_started_again_then_new_run_starts() {
    let temp = tempfile::tempdir().unwrap();
    let unconfigured = ServiceConfig {
        key_dir: Some(temp.path().join("absent")),
        ..loopback_config(true)
    };
    let controller = ServiceController::new(RecordingDesktop::new());
    controller.start(unconfigured).await.unwrap();
    controller.finished().await;

    controller.start(loopback_config(false)).await.unwrap();

    assert!(controller.is_running().await);
    controller.stop().await.unwrap();
}
