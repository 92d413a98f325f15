//! Tracing configuration and log routing.
//!
//! Events go to stdout through a compact formatter and are mirrored to a log file through a
//! non‑blocking writer. The file defaults to `logs/contentlens.log` and can be moved with
//! `CONTENTLENS_LOG_FILE`.
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_FILE: &str = "logs/contentlens.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` from configuration is used, falling back
/// to `info` if it is not a valid filter directive.
pub fn init_tracing(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();
    let file_layer = file_writer(&log_file_path()).map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();
}

fn log_file_path() -> PathBuf {
    std::env::var("CONTENTLENS_LOG_FILE")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

/// Open `path` for appending behind a non‑blocking writer.
///
/// Returns `None` when the parent directory cannot be created; logging then stays stdout-only.
fn file_writer(path: &Path) -> Option<NonBlocking> {
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name()?;

    if let Err(err) = std::fs::create_dir_all(directory) {
        eprintln!("Failed to create log directory {}: {err}", directory.display());
        return None;
    }

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}
