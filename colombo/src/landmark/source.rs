//! Point-of-interest search abstraction.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coord::Coordinate;
use crate::provider::{BoxFuture, ProviderError};

/// Structured postal address of a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// Returns true if no component is set.
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.house_number.is_none()
            && self.postcode.is_none()
            && self.city.is_none()
            && self.country.is_none()
    }

    /// Single-line rendering, e.g. `"Champ de Mars 5, 75007 Paris, France"`.
    pub fn formatted(&self) -> String {
        let street = match (&self.street, &self.house_number) {
            (Some(s), Some(n)) => Some(format!("{} {}", s, n)),
            (Some(s), None) => Some(s.clone()),
            _ => None,
        };
        let locality = match (&self.postcode, &self.city) {
            (Some(p), Some(c)) => Some(format!("{} {}", p, c)),
            (None, Some(c)) => Some(c.clone()),
            (Some(p), None) => Some(p.clone()),
            (None, None) => None,
        };

        [street, locality, self.country.clone()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A point of interest returned by a [`LandmarkSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkCandidate {
    /// Provider-scoped identifier (e.g. `"way/5013364"`).
    pub external_id: String,
    pub name: String,
    pub coordinate: Coordinate,
    pub address: Option<Address>,
    pub phone: Option<String>,
    pub website_url: Option<String>,
}

impl LandmarkCandidate {
    /// Creates a candidate with only the required fields.
    pub fn new(external_id: impl Into<String>, name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            external_id: external_id.into(),
            name: name.into(),
            coordinate,
            address: None,
            phone: None,
            website_url: None,
        }
    }
}

/// Kind of point of interest to search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PoiCategory {
    /// Monuments, historic sites and tourist attractions.
    #[default]
    Landmark,
    /// Museums and galleries.
    Museum,
    /// Anything with a name.
    Any,
}

impl PoiCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoiCategory::Landmark => "landmark",
            PoiCategory::Museum => "museum",
            PoiCategory::Any => "any",
        }
    }

    /// Parses a config value (case-insensitive).
    pub fn from_config_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "landmark" => Some(PoiCategory::Landmark),
            "museum" => Some(PoiCategory::Museum),
            "any" => Some(PoiCategory::Any),
            _ => None,
        }
    }
}

impl fmt::Display for PoiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`LandmarkSource::search_nearby`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LandmarkSourceError {
    /// The provider found nothing. Callers treat this as an empty result.
    #[error("No points of interest found")]
    NoResults,

    /// Transport, authentication or decoding failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// A point-of-interest search provider.
///
/// Implementations return candidates in provider relevance order and drop
/// any entry without a resolvable coordinate.
pub trait LandmarkSource: Send + Sync {
    /// Searches for points of interest of `category` within `radius_meters`
    /// of `coordinate`.
    fn search_nearby(
        &self,
        coordinate: Coordinate,
        radius_meters: f64,
        category: PoiCategory,
    ) -> BoxFuture<'_, Result<Vec<LandmarkCandidate>, LandmarkSourceError>>;

    /// Human-readable provider name for logs.
    fn name(&self) -> &str;
}
