//! Narration errors.

use thiserror::Error;

use crate::provider::TransportError;

/// Errors returned by [`NarrationService::request_narration`](super::NarrationService::request_narration).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarrationError {
    #[error("Invalid narration service URL: {0}")]
    InvalidUrl(String),

    /// No credential was available, or the backend rejected it.
    #[error("Authentication required. Please sign in again.")]
    Unauthorized,

    /// Backend answered 400: the place lacked data to build a story.
    #[error("Not enough information about this place to tell its story.")]
    MissingData,

    #[error("Server error. Please try again later.")]
    ServerError,

    /// Backend answered 408 or the request exceeded its timeout.
    #[error("The request timed out. Please try again.")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode narration: {0}")]
    Decode(String),

    #[error("Unexpected response from server (HTTP {0})")]
    InvalidResponse(u16),
}

impl NarrationError {
    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => NarrationError::MissingData,
            401 => NarrationError::Unauthorized,
            408 => NarrationError::Timeout,
            500 => NarrationError::ServerError,
            other => NarrationError::InvalidResponse(other),
        }
    }
}

impl From<TransportError> for NarrationError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => NarrationError::Timeout,
            TransportError::InvalidUrl(url) => NarrationError::InvalidUrl(url),
            other => NarrationError::Network(other.to_string()),
        }
    }
}
