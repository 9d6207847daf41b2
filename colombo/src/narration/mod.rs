//! Narration backend
//!
//! Sends a selected landmark to the narration backend and receives the
//! story text plus a URL of the synthesized audio. Every request carries a
//! bearer token from a [`CredentialProvider`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use colombo::narration::{HttpNarrationService, NarrationRequest, NarrationService, SessionCredentials};
//! use colombo::provider::ReqwestClient;
//!
//! let credentials = Arc::new(SessionCredentials::new(Some(token)));
//! let service = HttpNarrationService::new(ReqwestClient::new()?, credentials);
//!
//! let story = service
//!     .request_narration(&NarrationRequest::new(landmark).with_language("en"))
//!     .await?;
//! println!("{}", story.story_text);
//! ```

mod credentials;
mod error;
mod models;
mod service;

pub use credentials::{CredentialProvider, EnvCredentials, SessionCredentials, ACCESS_TOKEN_ENV};
pub use error::NarrationError;
pub use models::{NarrationRequest, NarrationResult};
pub use service::{
    HttpNarrationService, NarrationService, DEFAULT_NARRATION_BASE_URL, DEFAULT_NARRATION_TIMEOUT,
};
