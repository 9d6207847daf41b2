//! Landmark discovery
//!
//! Turns a user position into a ranked list of landmarks:
//!
//! 1. Search the [`LandmarkSource`](crate::landmark::LandmarkSource) around
//!    the position.
//! 2. Drop candidates outside the search radius and sort the rest by
//!    distance.
//! 3. Ask the [`GeosearchClient`](crate::geosearch::GeosearchClient) for an
//!    article next to each candidate, a few lookups at a time.
//! 4. Publish the confirmed landmarks as one [`LandmarkSnapshot`].
//!
//! Lookup failures exclude a single candidate; they never fail the cycle.
//! The worker started by [`LandmarkDiscoveryEngine::spawn`] runs at most
//! one cycle at a time and coalesces triggers that arrive meanwhile.

mod config;
mod engine;
mod model;
mod worker;

pub use config::{
    DiscoveryConfig, DEFAULT_ARTICLE_LIMIT, DEFAULT_ARTICLE_RADIUS_METERS,
    DEFAULT_ENRICHMENT_CONCURRENCY, DEFAULT_ENRICHMENT_TIMEOUT, DEFAULT_SEARCH_RADIUS_METERS,
};
pub use engine::{rank_candidates, DiscoveryReport, LandmarkDiscoveryEngine};
pub use model::{DiscoveryStatus, Landmark, LandmarkSnapshot};
pub use worker::DiscoveryHandle;

#[cfg(test)]
pub(crate) use engine::tests::{ScriptedGeosearch, StaticSource};
