//! Wikipedia geosearch client.
//!
//! Uses the MediaWiki Action API `list=geosearch` module:
//!
//! ```text
//! GET https://{lang}.wikipedia.org/w/api.php
//!     ?action=query&list=geosearch&gscoord={lat}|{lon}
//!     &gsradius={meters}&gslimit={n}&format=json
//! ```
//!
//! `gsradius` is an integer number of meters in [10, 10000] and `gslimit`
//! is at most 500. Arguments outside those ranges are rejected before any
//! request is made rather than clamped.

use std::time::Duration;

use thiserror::Error;

use super::models::{GeoArticle, GeosearchResponse};
use crate::coord::Coordinate;
use crate::provider::{BoxFuture, HttpClient, HttpRequest, TransportError};

/// Smallest radius the geosearch API accepts, in meters.
pub const MIN_RADIUS_METERS: u32 = 10;

/// Largest radius the geosearch API accepts, in meters.
pub const MAX_RADIUS_METERS: u32 = 10_000;

/// Largest result limit the geosearch API accepts.
pub const MAX_LIMIT: u32 = 500;

/// Default request timeout for geosearch calls.
pub const DEFAULT_GEOSEARCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors returned by [`GeosearchClient::fetch_nearby`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeosearchError {
    /// Radius or limit outside the provider's accepted range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Transport failure or non-success HTTP status.
    #[error("Network error: {0}")]
    Network(String),

    /// Response body was not the expected JSON shape.
    #[error("Failed to decode geosearch response: {0}")]
    Decode(String),
}

impl From<TransportError> for GeosearchError {
    fn from(err: TransportError) -> Self {
        GeosearchError::Network(err.to_string())
    }
}

/// Queries an article index for entries near a coordinate.
///
/// Implementations are stateless: one call, one outbound request, no retries.
pub trait GeosearchClient: Send + Sync {
    /// Fetches up to `limit` articles within `radius_meters` of `coordinate`,
    /// nearest first.
    fn fetch_nearby(
        &self,
        coordinate: Coordinate,
        radius_meters: f64,
        limit: u32,
    ) -> BoxFuture<'_, Result<Vec<GeoArticle>, GeosearchError>>;
}

/// Converts a radius in meters to the provider's integer parameter.
pub fn validate_radius(radius_meters: f64) -> Result<u32, GeosearchError> {
    if !radius_meters.is_finite() {
        return Err(GeosearchError::InvalidArgument(format!(
            "radius must be finite, got {}",
            radius_meters
        )));
    }
    let rounded = radius_meters.round();
    if rounded < MIN_RADIUS_METERS as f64 || rounded > MAX_RADIUS_METERS as f64 {
        return Err(GeosearchError::InvalidArgument(format!(
            "radius {}m outside [{}, {}]",
            radius_meters, MIN_RADIUS_METERS, MAX_RADIUS_METERS
        )));
    }
    Ok(rounded as u32)
}

/// Validates the result limit.
pub fn validate_limit(limit: u32) -> Result<u32, GeosearchError> {
    if limit == 0 || limit > MAX_LIMIT {
        return Err(GeosearchError::InvalidArgument(format!(
            "limit {} outside [1, {}]",
            limit, MAX_LIMIT
        )));
    }
    Ok(limit)
}

/// Wikipedia geosearch client.
///
/// # Example
///
/// ```no_run
/// use colombo::geosearch::{GeosearchClient, WikipediaGeosearch};
/// use colombo::provider::ReqwestClient;
/// use colombo::coord::Coordinate;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = WikipediaGeosearch::new(ReqwestClient::new()?, "en");
/// let eiffel = Coordinate::new(48.8584, 2.2945)?;
/// let articles = client.fetch_nearby(eiffel, 100.0, 5).await?;
/// # Ok(())
/// # }
/// ```
pub struct WikipediaGeosearch<C: HttpClient> {
    http_client: C,
    endpoint: String,
    timeout: Duration,
}

impl<C: HttpClient> WikipediaGeosearch<C> {
    /// Creates a client for the given Wikipedia language edition.
    pub fn new(http_client: C, language: &str) -> Self {
        Self::with_endpoint(
            http_client,
            format!("https://{}.wikipedia.org/w/api.php", language),
        )
    }

    /// Creates a client against an explicit `api.php` endpoint.
    pub fn with_endpoint(http_client: C, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            timeout: DEFAULT_GEOSEARCH_TIMEOUT,
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the request URL.
    ///
    /// Only `gscoord` contains a reserved character; `|` is percent-encoded.
    fn build_url(&self, coordinate: &Coordinate, radius: u32, limit: u32) -> String {
        format!(
            "{}?action=query&list=geosearch&gscoord={}%7C{}&gsradius={}&gslimit={}&format=json",
            self.endpoint, coordinate.latitude, coordinate.longitude, radius, limit
        )
    }
}

impl<C: HttpClient> GeosearchClient for WikipediaGeosearch<C> {
    fn fetch_nearby(
        &self,
        coordinate: Coordinate,
        radius_meters: f64,
        limit: u32,
    ) -> BoxFuture<'_, Result<Vec<GeoArticle>, GeosearchError>> {
        Box::pin(async move {
            let radius = validate_radius(radius_meters)?;
            let limit = validate_limit(limit)?;

            let url = self.build_url(&coordinate, radius, limit);
            let request = HttpRequest::get(url).with_timeout(self.timeout);
            let response = self.http_client.send(request).await?;

            if !response.is_success() {
                return Err(GeosearchError::Network(format!(
                    "HTTP {} from geosearch",
                    response.status
                )));
            }

            let parsed: GeosearchResponse = serde_json::from_slice(&response.body)
                .map_err(|e| GeosearchError::Decode(e.to_string()))?;

            let articles: Vec<GeoArticle> = parsed
                .query
                .geosearch
                .into_iter()
                .map(GeoArticle::from)
                .collect();

            tracing::debug!(
                coordinate = %coordinate,
                radius,
                limit,
                found = articles.len(),
                "Geosearch completed"
            );

            Ok(articles)
        })
    }
}
