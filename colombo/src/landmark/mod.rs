//! Point-of-interest search
//!
//! A [`LandmarkSource`] returns named candidates near a coordinate. The
//! shipped implementation queries OpenStreetMap through the Overpass API;
//! tests substitute in-memory sources.
//!
//! # Example
//!
//! ```ignore
//! use colombo::landmark::{LandmarkSource, OverpassLandmarkSource, PoiCategory};
//! use colombo::provider::ReqwestClient;
//!
//! let source = OverpassLandmarkSource::new(ReqwestClient::new()?);
//! let candidates = source
//!     .search_nearby(position, 50.0, PoiCategory::Landmark)
//!     .await?;
//! ```

mod overpass;
mod source;

pub use overpass::{OverpassLandmarkSource, DEFAULT_OVERPASS_ENDPOINT, DEFAULT_OVERPASS_TIMEOUT};
pub use source::{Address, LandmarkCandidate, LandmarkSource, LandmarkSourceError, PoiCategory};
