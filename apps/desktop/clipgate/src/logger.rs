//! Logging for the clipgate host application.
//!
//! Coloured stderr plus a plain log file, installed once per process. Stdout
//! is left to command output (`clipgate paste`).

use crate::error::AppError;

use std::fs::File;
use std::io::stderr;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

const LOG_FILE_NAME: &str = "clipgate.log";

const LOG_DIR_NAME: &str = "clipgate";

const LOGGER_INITIALIZED_MESSAGE_PREFIX: &str = "Logger initialized with level: ";

const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

#[cfg(debug_assertions)]
const LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// `<data_dir>/clipgate`
pub fn default_log_dir() -> Result<PathBuf, AppError> {
    dirs::data_dir()
        .map(|dir| dir.join(LOG_DIR_NAME))
        .ok_or_else(|| AppError::clipgate("Failed to resolve the platform data directory"))
}

/// Level for this run: debug when asked for, the build default otherwise.
pub fn level_for(debug: bool) -> LevelFilter {
    if debug { LevelFilter::Debug } else { LOG_LEVEL }
}

/// Initialize the logger with dual output (stderr + file).
///
/// Safe to call more than once: later calls log a warning and return Ok.
///
/// # Errors
///
/// Returns an error if:
/// - Log file cannot be created
/// - Logger dispatch configuration fails
pub fn initialize(log_dir: &Path, debug: bool) -> Result<(), AppError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let level = level_for(debug);
    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_dir, level);
        if result.is_ok() {
            info!("{LOGGER_INITIALIZED_MESSAGE_PREFIX}{level:?}");
        }
    });

    result
}

#[track_caller]
fn initialize_internal(log_dir: &Path, level: LevelFilter) -> Result<(), AppError> {
    let color_configuration = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let base_dispatch = Dispatch::new().level(level);

    let stderr_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{target}]",
                date = format_rfc3339(SystemTime::now()),
                level = color_configuration.color(record.level()),
                message = message,
                target = record.target(),
            ))
        })
        .chain(stderr());

    // Plain text, no colours
    let file_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{file}:{line}]",
                date = format_rfc3339(SystemTime::now()),
                level = record.level(),
                message = message,
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0)
            ))
        })
        .chain(open_log_file(log_dir)?);

    base_dispatch
        .chain(stderr_dispatch)
        .chain(file_dispatch)
        .apply()
        .map_err(|e| AppError::clipgate(format!("Failed to initialize logger: {e}")))?;

    Ok(())
}

/// Open `<log_dir>/clipgate.log` for appending.
#[track_caller]
pub(crate) fn open_log_file(log_dir: &Path) -> Result<File, AppError> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);
    fern::log_file(&log_file_path).map_err(|e| {
        AppError::clipgate(format!(
            "Failed to create log file {}: {e}",
            log_file_path.display()
        ))
    })
}
