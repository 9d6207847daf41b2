//! Application error types.

use thiserror::Error;

use crate::config::ConfigError;
use crate::logging::LoggingError;
use crate::places::PlaceDirectoryError;
use crate::playback::PlaybackError;
use crate::provider::TransportError;

/// Errors surfaced by the [`TourGuide`](super::TourGuide) facade.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to build the shared HTTP client.
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] TransportError),

    /// The selected id is not in the current landmark list.
    #[error("Landmark '{0}' is not in the current list")]
    UnknownLandmark(String),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("Place lookup failed: {0}")]
    Places(#[from] PlaceDirectoryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    /// The facade has been shut down.
    #[error("Tour guide is shut down")]
    ShutDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::UnknownLandmark("node/42".to_string());
        assert_eq!(err.to_string(), "Landmark 'node/42' is not in the current list");
    }

    #[test]
    fn test_app_error_from_playback() {
        let err: AppError = PlaybackError::ControllerClosed.into();
        assert!(matches!(err, AppError::Playback(_)));
    }

    #[test]
    fn test_app_error_from_config() {
        let err: AppError = ConfigError::UnknownKey("x.y".to_string()).into();
        assert!(err.to_string().contains("Configuration error"));
    }
}
