//! Tracing setup
//!
//! Filter priority: `RUST_LOG`, then `-v` flags, then `logging.level`.
//! Events go to stderr (plain or JSON) and, when `logging.directory` is set,
//! to a daily rolling file.

use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::cli::{Error, Result};
use crate::config::LoggingConfig;

/// Level implied by `-v` count, falling back to the configured level
pub fn effective_level(config: &LoggingConfig, verbose: u8) -> String {
    match verbose {
        0 => config.level.trim().to_ascii_lowercase(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber
///
/// The returned guard flushes the file sink on drop; keep it alive for the
/// whole process.
pub fn init_logging(
    config: &LoggingConfig,
    verbose: u8,
    json_override: bool,
) -> Result<Option<WorkerGuard>> {
    let level = effective_level(config, verbose);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if config.json || json_override {
        layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
    } else {
        layers.push(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .boxed(),
        );
    }

    let mut guard = None;
    if let Some(dir) = config.directory() {
        fs::create_dir_all(&dir)?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("planrun")
            .filename_suffix("log")
            .build(&dir)
            .map_err(|e| Error::Logging(format!("{}: {e}", dir.display())))?;
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        layers.push(fmt::layer().with_ansi(false).with_writer(writer).boxed());
        guard = Some(worker_guard);
    }

    // A subscriber may already be installed (tests); keep it
    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init();

    Ok(guard)
}
