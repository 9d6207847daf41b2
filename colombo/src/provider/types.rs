//! Shared types for external service providers.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Transport-level failures reported by an [`HttpClient`](super::HttpClient).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request did not complete within its timeout.
    #[error("Request timed out")]
    Timeout,

    /// The connection could not be established.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Any other failure while sending or reading the response.
    #[error("Request failed: {0}")]
    Request(String),
}

/// Errors from point-of-interest and article providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Transport failure talking to the provider.
    #[error("HTTP error: {0}")]
    Transport(#[from] TransportError),

    /// Provider answered with a non-success status.
    #[error("HTTP {status} from {provider}")]
    Status { provider: &'static str, status: u16 },

    /// Provider rejected our credentials.
    #[error("{0} rejected the request credentials")]
    Unauthorized(&'static str),

    /// Response body could not be decoded.
    #[error("Invalid response from {provider}: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
}
