//! CLI error type and exit codes.

use colombo::app::AppError;
use colombo::config::ConfigError;
use colombo::logging::LoggingError;
use thiserror::Error;

/// Exit code for configuration and usage errors.
pub const EXIT_USAGE: i32 = 2;

/// Exit code for runtime failures (network, backend, playback).
pub const EXIT_FAILURE: i32 = 1;

/// Exit code after Ctrl+C.
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid configuration or setup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configuration file could not be read, written or applied.
    #[error("Configuration error: {0}")]
    Settings(#[from] ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    /// Invalid command-line argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Failed to start or drive the application.
    #[error(transparent)]
    App(#[from] AppError),

    /// Discovery produced nothing usable.
    #[error("Discovery failed: {0}")]
    Discovery(String),

    /// The narration backend failed.
    #[error("Narration failed: {0}")]
    Narration(String),

    /// Playback ended in a failure state.
    #[error("Playback failed: {0}")]
    Playback(String),

    /// Failed to create the Tokio runtime.
    #[error("Failed to create Tokio runtime: {0}")]
    Runtime(String),

    /// Stopped by Ctrl+C.
    #[error("Interrupted")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_)
            | CliError::Settings(_)
            | CliError::Logging(_)
            | CliError::InvalidArgument(_)
            | CliError::App(AppError::Config(_))
            | CliError::App(AppError::UnknownLandmark(_)) => EXIT_USAGE,
            CliError::Interrupted => EXIT_INTERRUPTED,
            _ => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Config("x".into()).exit_code(), EXIT_USAGE);
        assert_eq!(CliError::InvalidArgument("x".into()).exit_code(), EXIT_USAGE);
        assert_eq!(CliError::Narration("x".into()).exit_code(), EXIT_FAILURE);
        assert_eq!(CliError::Interrupted.exit_code(), EXIT_INTERRUPTED);
    }

    #[test]
    fn test_unknown_landmark_is_usage_error() {
        let err: CliError = AppError::UnknownLandmark("node/1".into()).into();
        assert_eq!(err.exit_code(), EXIT_USAGE);
        assert!(err.to_string().contains("node/1"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: CliError = ConfigError::UnknownKey("a.b".into()).into();
        assert!(matches!(err, CliError::Settings(_)));
        assert_eq!(err.exit_code(), EXIT_USAGE);
        assert!(err.to_string().starts_with("Configuration error: "));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            CliError::InvalidArgument("usage: rate <x>".into()).to_string(),
            "Invalid argument: usage: rate <x>"
        );
        assert_eq!(
            CliError::Playback("controller stopped".into()).to_string(),
            "Playback failed: controller stopped"
        );
        assert_eq!(CliError::Interrupted.to_string(), "Interrupted");
        assert_eq!(
            CliError::from(AppError::ShutDown).to_string(),
            "Tour guide is shut down"
        );
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let err: CliError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.exit_code(), EXIT_FAILURE);
        assert_eq!(err.to_string(), "I/O error: gone");
        assert!(err.source().is_some());
    }
}
