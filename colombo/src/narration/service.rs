//! Narration backend client.

use std::sync::Arc;
use std::time::Duration;

use super::credentials::CredentialProvider;
use super::error::NarrationError;
use super::models::{NarrationRequest, NarrationResult, VisitRequest};
use crate::provider::{BoxFuture, HttpClient, HttpRequest};

/// Default narration backend.
pub const DEFAULT_NARRATION_BASE_URL: &str = "https://colombo.guide";

/// Story generation includes speech synthesis, so allow a full minute.
pub const DEFAULT_NARRATION_TIMEOUT: Duration = Duration::from_secs(60);

const VISIT_PATH: &str = "api/places/visit";

/// Requests narrative content for a landmark.
///
/// Exactly one outbound request per call; no retries.
pub trait NarrationService: Send + Sync {
    fn request_narration<'a>(
        &'a self,
        request: &'a NarrationRequest,
    ) -> BoxFuture<'a, Result<NarrationResult, NarrationError>>;
}

impl<T: NarrationService + ?Sized> NarrationService for Arc<T> {
    fn request_narration<'a>(
        &'a self,
        request: &'a NarrationRequest,
    ) -> BoxFuture<'a, Result<NarrationResult, NarrationError>> {
        (**self).request_narration(request)
    }
}

/// HTTP implementation talking to the narration backend.
pub struct HttpNarrationService<C: HttpClient> {
    http_client: C,
    credentials: Arc<dyn CredentialProvider>,
    base_url: String,
    timeout: Duration,
}

impl<C: HttpClient> HttpNarrationService<C> {
    pub fn new(http_client: C, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            http_client,
            credentials,
            base_url: DEFAULT_NARRATION_BASE_URL.to_string(),
            timeout: DEFAULT_NARRATION_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn visit_url(&self) -> Result<String, NarrationError> {
        let base = format!("{}/", self.base_url.trim_end_matches('/'));
        reqwest::Url::parse(&base)
            .and_then(|url| url.join(VISIT_PATH))
            .map(String::from)
            .map_err(|e| NarrationError::InvalidUrl(format!("{}: {}", self.base_url, e)))
    }
}

impl<C: HttpClient> NarrationService for HttpNarrationService<C> {
    fn request_narration<'a>(
        &'a self,
        request: &'a NarrationRequest,
    ) -> BoxFuture<'a, Result<NarrationResult, NarrationError>> {
        Box::pin(async move {
            let url = self.visit_url()?;

            let Some(token) = self.credentials.access_token().await else {
                tracing::warn!("Narration requested without credentials");
                return Err(NarrationError::Unauthorized);
            };

            let body = VisitRequest::from(request);
            let http_request = HttpRequest::post_json(url, &body)
                .map_err(|e| NarrationError::Decode(e.to_string()))?
                .with_header("Authorization", format!("Bearer {}", token))
                .with_header("Accept", "application/json")
                .with_timeout(self.timeout);

            tracing::debug!(
                landmark = %request.landmark.name(),
                language = request.language_hint.as_deref().unwrap_or("default"),
                "Requesting narration"
            );

            let response = self.http_client.send(http_request).await?;

            if !response.is_success() {
                let err = NarrationError::from_status(response.status);
                tracing::warn!(status = response.status, error = %err, "Narration request failed");
                return Err(err);
            }

            let result: NarrationResult = serde_json::from_slice(&response.body)
                .map_err(|e| NarrationError::Decode(e.to_string()))?;

            tracing::info!(
                place = %result.place_name,
                story_chars = result.story_text.len(),
                "Narration received"
            );

            Ok(result)
        })
    }
}
