//! Geosearch data model and MediaWiki wire format.

use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;

/// An encyclopedia article located near a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoArticle {
    pub page_id: i64,
    pub title: String,
    pub coordinate: Coordinate,
    /// Distance from the query coordinate as reported by the provider.
    pub distance_meters: f64,
}

/// `{ "query": { "geosearch": [...] } }`
#[derive(Debug, Deserialize)]
pub(crate) struct GeosearchResponse {
    pub query: GeosearchQuery,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeosearchQuery {
    #[serde(default)]
    pub geosearch: Vec<GeosearchEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeosearchEntry {
    pub pageid: i64,
    pub title: String,
    pub lat: f64,
    pub lon: f64,
    pub dist: f64,
}

impl From<GeosearchEntry> for GeoArticle {
    fn from(entry: GeosearchEntry) -> Self {
        Self {
            page_id: entry.pageid,
            title: entry.title,
            coordinate: Coordinate {
                latitude: entry.lat,
                longitude: entry.lon,
            },
            distance_meters: entry.dist,
        }
    }
}
