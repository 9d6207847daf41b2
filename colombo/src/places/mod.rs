//! Backend place directory.
//!
//! Looks up the backend's stored record for a landmark by its external id,
//! through the PostgREST endpoint exposed by the backend database:
//!
//! ```text
//! GET {base}/rest/v1/places?select=id,mapbox_id,place_name&mapbox_id=eq.{id}
//! apikey: {key}
//! ```

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::provider::{BoxFuture, HttpClient, HttpRequest, ProviderError, TransportError};

const PROVIDER_NAME: &str = "places";

/// Default timeout for directory lookups.
pub const DEFAULT_PLACES_TIMEOUT: Duration = Duration::from_secs(10);

/// Primary key of a stored place. The backend uses integers for older rows
/// and UUIDs for newer ones.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PlaceId {
    Number(i64),
    Text(String),
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceId::Number(n) => write!(f, "{}", n),
            PlaceId::Text(s) => f.write_str(s),
        }
    }
}

/// A stored place record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaceRecord {
    pub id: PlaceId,
    #[serde(rename = "mapbox_id")]
    pub external_id: String,
    #[serde(default)]
    pub place_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceDirectoryError {
    #[error("Place directory is not configured")]
    NotConfigured,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Lookup of stored place records.
pub trait PlaceDirectory: Send + Sync {
    /// Returns the record stored for `external_id`, if any.
    fn find_by_external_id<'a>(
        &'a self,
        external_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<PlaceRecord>, PlaceDirectoryError>>;
}

/// PostgREST-backed directory.
pub struct RestPlaceDirectory<C: HttpClient> {
    http_client: C,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl<C: HttpClient> RestPlaceDirectory<C> {
    pub fn new(http_client: C, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_PLACES_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn lookup_url(&self, external_id: &str) -> Result<String, ProviderError> {
        let endpoint = format!("{}/rest/v1/places", self.base_url.trim_end_matches('/'));
        let filter = format!("eq.{}", external_id);
        reqwest::Url::parse_with_params(
            &endpoint,
            &[
                ("select", "id,mapbox_id,place_name"),
                ("mapbox_id", filter.as_str()),
            ],
        )
        .map(String::from)
        .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", endpoint, e)).into())
    }
}

impl<C: HttpClient> PlaceDirectory for RestPlaceDirectory<C> {
    fn find_by_external_id<'a>(
        &'a self,
        external_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<PlaceRecord>, PlaceDirectoryError>> {
        Box::pin(async move {
            if self.api_key.is_empty() {
                return Err(PlaceDirectoryError::NotConfigured);
            }

            let request = HttpRequest::get(self.lookup_url(external_id)?)
                .with_header("apikey", self.api_key.as_str())
                .with_header("Authorization", format!("Bearer {}", self.api_key))
                .with_timeout(self.timeout);

            let response = self
                .http_client
                .send(request)
                .await
                .map_err(ProviderError::from)?;

            match response.status {
                200..=299 => {}
                401 | 403 => return Err(ProviderError::Unauthorized(PROVIDER_NAME).into()),
                status => {
                    return Err(ProviderError::Status {
                        provider: PROVIDER_NAME,
                        status,
                    }
                    .into())
                }
            }

            let records: Vec<PlaceRecord> =
                serde_json::from_slice(&response.body).map_err(|e| ProviderError::Decode {
                    provider: PROVIDER_NAME,
                    message: e.to_string(),
                })?;

            tracing::debug!(external_id, found = records.len(), "Place lookup completed");
            Ok(records.into_iter().next())
        })
    }
}
