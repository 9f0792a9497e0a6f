//! Log file setup
//!
//! The terminal is owned by the TUI, so tracing output goes to
//! `coindash.log` in the platform data directory instead of stderr.

use std::path::PathBuf;

use directories::ProjectDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "coindash.log";

/// Returns the platform data directory used for logs
pub fn default_log_dir() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "coindash")?;
    Some(project_dirs.data_dir().to_path_buf())
}

/// Builds the filter: `RUST_LOG` first, then `coindash=<level>`
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(
        format!("coindash={}", level)
            .parse()
            .unwrap_or_else(|_| "coindash=info".parse().expect("fallback directive is valid")),
    )
}

/// Installs the global subscriber writing to `dir/coindash.log`.
///
/// Returns the writer guard, which must live until shutdown so buffered
/// lines are flushed. Returns `None` when no directory is known or it cannot
/// be created; the dashboard then runs without logs.
pub fn init(level: &str, dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let dir = dir.or_else(default_log_dir)?;
    std::fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::never(&dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(build_filter(level))
        .try_init()
        .ok()?;

    Some(guard)
}
