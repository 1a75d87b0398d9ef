//! Tracing initialization for the library host and the CLI.

use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::storage::path_utils;

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Append structured logs to `{data_dir}/settings-store.log`.
///
/// Falls back to stderr if the log file cannot be opened. Safe to call more
/// than once: later calls are ignored.
pub fn init_file_tracing() {
    let log_path = path_utils::log_path();
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path);

    match log_file {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter("info"))
                .with_writer(Mutex::new(file))
                .with_target(true)
                .with_ansi(false)
                .try_init()
                .ok();
        }
        Err(e) => {
            init_stderr_tracing();
            tracing::warn!(path = %log_path.display(), error = %e, "Cannot open log file, logging to stderr");
        }
    }
}

/// Human-facing logs on stderr, `warn` by default so CLI output stays clean.
pub fn init_stderr_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}
