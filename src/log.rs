//! Logging setup: a global `tracing` subscriber configured once per
//! process, an `EnvFilter` derived from `--log-level`, and an optional
//! non-blocking file layer via `tracing-appender`.
//!
//! A `tracing` subscriber is process-global, so `init` is called once from
//! `main`; the "Client"/"Server" tag a connection carries becomes a
//! `tracing` span field attached to its log lines rather than a parameter
//! threaded through a logger object.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Holds resources that must outlive the process for file logging to flush.
///
/// `tracing-appender`'s non-blocking writer spawns a background thread and
/// flushes on drop; callers keep this alive (typically in `main`) for as
/// long as logging is needed.
pub struct LogGuard(#[allow(dead_code)] Option<WorkerGuard>);

/// Initializes the global `tracing` subscriber.
///
/// `level` is a filter directive such as `"INFO"`, `"debug"`, or a full
/// `tracing_subscriber::EnvFilter` directive string. `log_file`, if given,
/// additionally writes to that path via a non-blocking appender.
pub fn init(level: &str, log_file: Option<&Path>) -> LogGuard {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        None => {
            registry.with(fmt::layer().with_target(false)).init();
            LogGuard(None)
        }
        Some(path) => {
            let (appender, guard) = file_appender(path);
            registry
                .with(fmt::layer().with_target(false))
                .with(fmt::layer().with_ansi(false).with_writer(appender))
                .init();
            LogGuard(Some(guard))
        }
    }
}

fn file_appender(path: &Path) -> (tracing_appender::non_blocking::NonBlocking, WorkerGuard) {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        let _ = std::fs::create_dir_all(dir);
    }
    let file_name: PathBuf = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("bgpy.log"));
    let dir = dir.unwrap_or_else(|| Path::new("."));
    let appender = tracing_appender::rolling::never(dir, file_name);
    tracing_appender::non_blocking(appender)
}
