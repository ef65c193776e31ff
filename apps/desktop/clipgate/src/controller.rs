use crate::error::AppError;

use common::ErrorLocation;

use remote_core::config::ServiceConfig;
use remote_core::error::ServiceError;
use remote_core::server::start_service;
use remote_core::service::DesktopAccess;

use std::panic::Location;
use std::sync::Arc;

use log::{error, info, warn};
use tokio::spawn as TokioSpawn;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One background run of the remote-control service.
struct RunningService {
    /// Fired by the controller to stop the accept loop.
    cancel: CancellationToken,

    /// Fired by the service task once `start_service` has returned.
    finished: CancellationToken,

    handle: JoinHandle<Result<(), ServiceError>>,
}

/// Start/stop handle for the remote-control service.
///
/// This is what a tray menu toggles. Clones share the same service slot, so
/// at most one service runs per controller.
#[derive(Clone)]
pub struct ServiceController {
    desktop: Arc<dyn DesktopAccess>,
    running: Arc<Mutex<Option<RunningService>>>,
}

impl ServiceController {
    pub fn new(desktop: Arc<dyn DesktopAccess>) -> Self {
        Self {
            desktop,
            running: Arc::new(Mutex::new(None)),
        }
    }

    /// Start serving `config` in the background.
    ///
    /// A previous run that already ended on its own is reaped first.
    ///
    /// # Errors
    ///
    /// [`AppError::AlreadyRunning`] while a previous run is still serving.
    pub async fn start(&self, config: ServiceConfig) -> Result<(), AppError> {
        let mut running = self.running.lock().await;

        if let Some(existing) = running.take() {
            if !existing.finished.is_cancelled() {
                *running = Some(existing);
                warn!("Start requested but remote control is already running");
                return Err(AppError::AlreadyRunning {
                    message: String::from("Remote control is already running - stop it first"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            log_outcome(existing.handle.await);
        }

        let cancel = CancellationToken::new();
        let finished = CancellationToken::new();
        let desktop = Arc::clone(&self.desktop);

        info!(
            "Starting remote control on {}:{} ({})",
            config.bind_address,
            config.port,
            if config.signed { "signed" } else { "plain" }
        );

        let handle = TokioSpawn({
            let cancel = cancel.clone();
            let finished = finished.clone();
            async move {
                let result = start_service(config, desktop, cancel).await;
                finished.cancel();
                result
            }
        });

        *running = Some(RunningService {
            cancel,
            finished,
            handle,
        });

        Ok(())
    }

    /// Stop the service and wait for the accept loop to return.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotRunning`] when nothing was started
    /// - [`AppError::Core`] when the service had failed on its own
    pub async fn stop(&self) -> Result<(), AppError> {
        let Some(existing) = self.running.lock().await.take() else {
            warn!("Stop requested but remote control is not running");
            return Err(AppError::NotRunning {
                message: String::from("Remote control is not running - nothing to stop"),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        existing.cancel.cancel();

        match existing.handle.await {
            Ok(Ok(())) => {
                info!("Remote control stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                error!("Remote control had failed: {e}");
                Err(e.into())
            }
            Err(e) => {
                error!("Remote control task did not finish: {e}");
                Err(AppError::clipgate(format!(
                    "Remote control task did not finish: {e}"
                )))
            }
        }
    }

    /// True while a started service is still serving.
    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|running| !running.finished.is_cancelled())
    }

    /// Resolves once the current run ends, on its own or through [`stop`].
    /// Returns at once when nothing is running.
    ///
    /// [`stop`]: ServiceController::stop
    pub async fn finished(&self) {
        let finished = self
            .running
            .lock()
            .await
            .as_ref()
            .map(|running| running.finished.clone());

        if let Some(finished) = finished {
            finished.cancelled().await;
        }
    }
}

fn log_outcome(outcome: Result<Result<(), ServiceError>, tokio::task::JoinError>) {
    match outcome {
        Ok(Ok(())) => info!("Previous remote control run ended"),
        Ok(Err(e)) => warn!("Previous remote control run failed: {e}"),
        Err(e) => warn!("Previous remote control task did not finish: {e}"),
    }
}
