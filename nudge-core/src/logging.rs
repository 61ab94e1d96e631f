//! File logging for nudge.
//!
//! One daily-rotated log file per day under the XDG state directory
//! (`~/.local/state/nudge/`), retention capped by `LoggingConfig.max_files`.
//! The level comes from `RUST_LOG` when set, otherwise from config.

use crate::config::{Config, LoggingConfig};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Rotated files are named `nudge.log.YYYY-MM-DD`.
const LOG_FILE_PREFIX: &str = "nudge.log";

/// Initialize the logging system and return its flush guard.
///
/// Rotated files older than the retention cap are pruned before the new
/// appender opens, so a long-lived install never accumulates more than
/// `max_files` days of logs plus the active one.
pub fn init(config: &LoggingConfig) -> crate::error::Result<LoggingGuard> {
    let log_dir = Config::state_dir();
    std::fs::create_dir_all(&log_dir)?;
    prune_rotated_logs(&log_dir, config.max_files)?;

    let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // RUST_LOG wins over the configured level.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!(
        log_dir = %log_dir.display(),
        level = %config.level,
        max_files = config.max_files,
        "Logging initialized"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Delete the oldest rotated log files until at most `max_files` remain.
///
/// The daily date suffix sorts chronologically, so lexicographic order is
/// age order. Unreadable directory entries are skipped, not fatal.
fn prune_rotated_logs(log_dir: &Path, max_files: usize) -> crate::error::Result<()> {
    let mut logs: Vec<PathBuf> = std::fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
        })
        .collect();
    if logs.len() <= max_files {
        return Ok(());
    }

    logs.sort();
    for stale in &logs[..logs.len() - max_files] {
        if let Err(e) = std::fs::remove_file(stale) {
            tracing::warn!(path = %stale.display(), "Failed to prune old log file: {}", e);
        }
    }
    Ok(())
}

/// Initialize logging for tests (captured per test, level from RUST_LOG).
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Keeps the background log writer alive; dropping it flushes pending
/// writes.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Returns the log file path
pub fn log_file_path() -> PathBuf {
    Config::log_path()
}
