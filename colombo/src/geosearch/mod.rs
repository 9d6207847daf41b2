//! Encyclopedia geosearch
//!
//! Finds reference articles located near a coordinate. The discovery engine
//! uses this to confirm that a point of interest is notable enough to
//! narrate: a candidate is kept only if at least one article sits within a
//! few meters of it.

mod client;
mod models;

pub use client::{
    validate_limit, validate_radius, GeosearchClient, GeosearchError, WikipediaGeosearch,
    DEFAULT_GEOSEARCH_TIMEOUT, MAX_LIMIT, MAX_RADIUS_METERS, MIN_RADIUS_METERS,
};
pub use models::GeoArticle;
