//! Tracing subscriber setup.
//!
//! Logs go to stderr with local RFC 3339 timestamps. When a directory is
//! configured, a second layer writes plain-text daily rolling files
//! (`colombo.log.YYYY-MM-DD`) through a non-blocking writer. `RUST_LOG`
//! takes precedence over the configured level.
//!
//! # Example
//!
//! ```ignore
//! let config = ConfigFile::load().unwrap_or_default();
//! let _guard = colombo::logging::init(
//!     &config.logging.level,
//!     config.logging.directory.as_deref(),
//! )?;
//! // Keep `_guard` alive until exit so buffered file output is flushed.
//! ```

use std::path::Path;

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing_appender::non_blocking::WorkerGuard;

/// Base name of rolling log files.
pub const LOG_FILE_PREFIX: &str = "colombo.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },

    #[error("Failed to create log directory: {0}")]
    Directory(#[from] std::io::Error),

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Builds the filter: `RUST_LOG` if set and valid, otherwise `level`.
pub fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidFilter {
        directive: level.to_string(),
        reason: e.to_string(),
    })
}

/// Installs the global subscriber.
///
/// Returns the file writer's guard when `directory` is set. Dropping it
/// flushes and stops the background writer.
pub fn init(level: &str, directory: Option<&Path>) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = build_filter(level)?;

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::new(Rfc3339))
        .with_target(false);

    let (file, guard) = match directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_timer(LocalTime::new(Rfc3339))
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    if let Some(dir) = directory {
        tracing::debug!(directory = %dir.display(), "File logging enabled");
    }

    Ok(guard)
}
