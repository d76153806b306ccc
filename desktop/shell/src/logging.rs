//! Logging setup with file rotation.

use crate::supervisor::LoggingSettings;

use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

const LOG_FILE_PREFIX: &str = "brief-desk";

/// Setup logging with console and rotating file output.
///
/// # Log Layers
/// - Console: human-readable, on stderr so CLI output stays clean
/// - File: plain text, daily rotation, `retention_count` files kept
///
/// `RUST_LOG` overrides the configured level.
pub fn setup_logging(
    data_dir: &Path,
    settings: &LoggingSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let logs_dir = logs_dir(data_dir, settings);
    std::fs::create_dir_all(&logs_dir)?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(true)
        .with_writer(std::io::stderr);

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(settings.retention_count)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(&logs_dir)?;

    let file_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

/// Relative log directories live under the data directory.
pub fn logs_dir(data_dir: &Path, settings: &LoggingSettings) -> PathBuf {
    let directory = Path::new(&settings.directory);
    if directory.is_absolute() {
        directory.to_path_buf()
    } else {
        data_dir.join(directory)
    }
}

/// Path of today's log file. The appender names daily files by UTC date.
pub fn current_log_path(data_dir: &Path, settings: &LoggingSettings) -> PathBuf {
    let today = chrono::Utc::now().format("%Y-%m-%d");
    logs_dir(data_dir, settings).join(format!("{LOG_FILE_PREFIX}.{today}.log"))
}
