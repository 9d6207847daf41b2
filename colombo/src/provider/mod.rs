//! External service plumbing
//!
//! This module provides the HTTP abstraction shared by every network-facing
//! component (geosearch, landmark search, narration, place directory) and
//! the error types they have in common.
//!
//! All providers take an [`HttpClient`] at construction so tests can swap in
//! a scripted client:
//!
//! ```ignore
//! use colombo::provider::ReqwestClient;
//! use colombo::geosearch::WikipediaGeosearch;
//!
//! let http = ReqwestClient::new()?;
//! let geosearch = WikipediaGeosearch::new(http, "en");
//! ```

mod http;
mod types;

pub use http::{
    HttpClient, HttpMethod, HttpRequest, HttpResponse, ReqwestClient, DEFAULT_HTTP_TIMEOUT,
    USER_AGENT,
};
pub use types::{BoxFuture, ProviderError, TransportError};

#[cfg(test)]
pub use http::tests::MockHttpClient;
