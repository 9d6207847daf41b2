//! OpenStreetMap Overpass landmark source.
//!
//! Issues an `around:` query for named features matching the requested
//! category and reads address and contact details from their tags.
//!
//! # Query shape
//!
//! ```text
//! [out:json][timeout:30];
//! (
//!   nwr(around:50,48.8584,2.2945)["historic"]["name"];
//!   nwr(around:50,48.8584,2.2945)["tourism"~"^(attraction|monument|artwork|viewpoint)$"]["name"];
//! );
//! out center tags;
//! ```
//!
//! Ways and relations carry no coordinate of their own; `out center` asks
//! the server for a representative point which is used instead.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use super::source::{Address, LandmarkCandidate, LandmarkSource, LandmarkSourceError, PoiCategory};
use crate::coord::Coordinate;
use crate::provider::{BoxFuture, HttpClient, HttpRequest, ProviderError, TransportError};

/// Public Overpass interpreter endpoint.
pub const DEFAULT_OVERPASS_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Default request timeout for Overpass calls.
pub const DEFAULT_OVERPASS_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER_NAME: &str = "Overpass";

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<OverpassCenter>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OverpassCenter {
    lat: f64,
    lon: f64,
}

impl OverpassElement {
    fn coordinate(&self) -> Option<Coordinate> {
        let (lat, lon) = match (self.lat, self.lon, &self.center) {
            (Some(lat), Some(lon), _) => (lat, lon),
            (_, _, Some(center)) => (center.lat, center.lon),
            _ => return None,
        };
        Coordinate::new(lat, lon).ok()
    }

    fn tag(&self, key: &str) -> Option<String> {
        self.tags
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn address(&self) -> Option<Address> {
        let address = Address {
            street: self.tag("addr:street"),
            house_number: self.tag("addr:housenumber"),
            postcode: self.tag("addr:postcode"),
            city: self.tag("addr:city"),
            country: self.tag("addr:country"),
        };
        (!address.is_empty()).then_some(address)
    }

    fn into_candidate(self) -> Option<LandmarkCandidate> {
        let name = self.tag("name")?;
        let coordinate = self.coordinate()?;

        Some(LandmarkCandidate {
            external_id: format!("{}/{}", self.kind, self.id),
            address: self.address(),
            phone: self.tag("phone").or_else(|| self.tag("contact:phone")),
            website_url: self.tag("website").or_else(|| self.tag("contact:website")),
            name,
            coordinate,
        })
    }
}

/// Landmark source backed by the OpenStreetMap Overpass API.
pub struct OverpassLandmarkSource<C: HttpClient> {
    http_client: C,
    endpoint: String,
    timeout: Duration,
}

impl<C: HttpClient> OverpassLandmarkSource<C> {
    /// Creates a source using the public Overpass endpoint.
    pub fn new(http_client: C) -> Self {
        Self::with_endpoint(http_client, DEFAULT_OVERPASS_ENDPOINT)
    }

    /// Creates a source against a specific interpreter endpoint.
    pub fn with_endpoint(http_client: C, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            timeout: DEFAULT_OVERPASS_TIMEOUT,
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the Overpass QL query for a search. The server-side
    /// `[timeout:N]` matches the client timeout in whole seconds.
    pub(crate) fn build_query(
        coordinate: &Coordinate,
        radius_meters: f64,
        category: PoiCategory,
        timeout: Duration,
    ) -> String {
        let around = format!(
            "nwr(around:{},{},{})",
            radius_meters.round().max(1.0),
            coordinate.latitude,
            coordinate.longitude
        );
        let selectors: Vec<String> = match category {
            PoiCategory::Landmark => vec![
                format!("{}[\"historic\"][\"name\"];", around),
                format!(
                    "{}[\"tourism\"~\"^(attraction|monument|artwork|viewpoint)$\"][\"name\"];",
                    around
                ),
            ],
            PoiCategory::Museum => vec![format!(
                "{}[\"tourism\"~\"^(museum|gallery)$\"][\"name\"];",
                around
            )],
            PoiCategory::Any => vec![format!("{}[\"name\"];", around)],
        };

        let timeout_secs = timeout.as_secs().max(1);
        format!(
            "[out:json][timeout:{}];({});out center tags;",
            timeout_secs,
            selectors.join("")
        )
    }

    fn build_url(&self, query: &str) -> Result<String, ProviderError> {
        reqwest::Url::parse_with_params(&self.endpoint, &[("data", query)])
            .map(String::from)
            .map_err(|e| {
                ProviderError::Transport(TransportError::InvalidUrl(format!(
                    "{}: {}",
                    self.endpoint, e
                )))
            })
    }

    /// Parses an Overpass JSON body into candidates, dropping unnamed or
    /// unlocated elements and duplicate ids.
    pub(crate) fn parse_candidates(body: &[u8]) -> Result<Vec<LandmarkCandidate>, ProviderError> {
        let response: OverpassResponse =
            serde_json::from_slice(body).map_err(|e| ProviderError::Decode {
                provider: PROVIDER_NAME,
                message: e.to_string(),
            })?;

        let mut seen = std::collections::HashSet::new();
        Ok(response
            .elements
            .into_iter()
            .filter_map(OverpassElement::into_candidate)
            .filter(|c| seen.insert(c.external_id.clone()))
            .collect())
    }
}

impl<C: HttpClient> LandmarkSource for OverpassLandmarkSource<C> {
    fn search_nearby(
        &self,
        coordinate: Coordinate,
        radius_meters: f64,
        category: PoiCategory,
    ) -> BoxFuture<'_, Result<Vec<LandmarkCandidate>, LandmarkSourceError>> {
        Box::pin(async move {
            let query = Self::build_query(&coordinate, radius_meters, category, self.timeout);
            let url = self.build_url(&query)?;

            let request = HttpRequest::get(url).with_timeout(self.timeout);
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

            let candidates = Self::parse_candidates(&response.body)?;

            tracing::debug!(
                coordinate = %coordinate,
                radius_m = radius_meters,
                category = %category,
                found = candidates.len(),
                "Overpass search completed"
            );

            Ok(candidates)
        })
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}
