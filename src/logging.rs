//! Tracing setup.
//!
//! The service logs to stdout through a compact formatter filtered by `RUST_LOG`
//! (default `info`). Setting `SCHOLAR_NLP_LOG_FILE` appends a second plain-text copy to
//! that file through a non-blocking writer, keeping inference and request handling off
//! the logging hot path; there is no file sink otherwise.

use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// Holds the worker guard so the non-blocking file writer keeps flushing until exit.
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the stdout subscriber and, when `SCHOLAR_NLP_LOG_FILE` is set, the file sink.
///
/// An unopenable log file is reported on stderr and logging continues stdout-only; a bad
/// logging destination should not keep the service from starting.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).compact());

    let log_file = std::env::var("SCHOLAR_NLP_LOG_FILE").ok().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .inspect_err(|err| eprintln!("Failed to open log file {path}: {err}"))
            .ok()
    });

    match log_file {
        Some(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let _ = LOG_GUARD.set(guard);
            registry
                .with(fmt::layer().with_writer(writer).with_ansi(false).compact())
                .init();
        }
        None => registry.init(),
    }
}
