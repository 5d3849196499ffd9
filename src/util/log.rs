use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::file_logger::FileLogger;

/// Initialize structured logging with tracing.
///
/// The terminal is owned by the TUI, so events go to a daily file under
/// `log_dir` (default `~/.fabricant/logs`). Log level can be controlled via
/// RUST_LOG env var, default level is "info".
///
/// Returns the directory logs are written to, or `None` when no home
/// directory could be found and logging is disabled.
pub fn init_logging(log_dir: Option<PathBuf>) -> Option<PathBuf> {
    let log_dir = log_dir.or_else(FileLogger::default_dir)?;

    let logger = FileLogger::new(log_dir);
    logger.cleanup_old_logs();
    let log_dir = logger.log_dir().to_path_buf();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(logger)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(filter)
        .init();

    Some(log_dir)
}
