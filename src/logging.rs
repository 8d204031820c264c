//! Log output setup: console plus one timestamped file per run

use crate::error::{AutomationError, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::io::IsTerminal;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// File name for a run started at `started`
pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("automation_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// until the process exits.
pub fn init_logging(logs_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(logs_dir).map_err(|e| {
        AutomationError::ConfigError(format!(
            "Cannot create logs directory {}: {}",
            logs_dir.display(),
            e
        ))
    })?;

    let file_appender = tracing_appender::rolling::never(logs_dir, log_file_name(Local::now()));
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(std::io::stdout().is_terminal()),
        )
        .with(
            fmt::layer()
                .with_target(false)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .map_err(|e| AutomationError::ConfigError(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}
