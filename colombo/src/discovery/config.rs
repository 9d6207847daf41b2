//! Discovery engine configuration.

use std::time::Duration;

use crate::landmark::PoiCategory;

/// Default radius around the user searched for candidates, in meters.
pub const DEFAULT_SEARCH_RADIUS_METERS: f64 = 50.0;

/// Default radius around a candidate searched for articles, in meters.
///
/// Matches the smallest radius the geosearch API accepts.
pub const DEFAULT_ARTICLE_RADIUS_METERS: f64 = 10.0;

/// Articles requested per candidate. One is enough to confirm a match.
pub const DEFAULT_ARTICLE_LIMIT: u32 = 1;

/// Default number of enrichment lookups in flight per cycle.
pub const DEFAULT_ENRICHMENT_CONCURRENCY: usize = 4;

/// Upper bound on a single enrichment lookup.
pub const DEFAULT_ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(20);

/// Configuration for [`LandmarkDiscoveryEngine`](super::LandmarkDiscoveryEngine).
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryConfig {
    pub search_radius_meters: f64,
    pub article_radius_meters: f64,
    pub article_limit: u32,
    pub enrichment_concurrency: usize,
    pub enrichment_timeout: Duration,
    pub category: PoiCategory,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            search_radius_meters: DEFAULT_SEARCH_RADIUS_METERS,
            article_radius_meters: DEFAULT_ARTICLE_RADIUS_METERS,
            article_limit: DEFAULT_ARTICLE_LIMIT,
            enrichment_concurrency: DEFAULT_ENRICHMENT_CONCURRENCY,
            enrichment_timeout: DEFAULT_ENRICHMENT_TIMEOUT,
            category: PoiCategory::Landmark,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_search_radius(mut self, meters: f64) -> Self {
        self.search_radius_meters = meters;
        self
    }

    pub fn with_article_radius(mut self, meters: f64) -> Self {
        self.article_radius_meters = meters;
        self
    }

    /// Sets the enrichment concurrency. Zero is treated as one.
    pub fn with_enrichment_concurrency(mut self, concurrency: usize) -> Self {
        self.enrichment_concurrency = concurrency.max(1);
        self
    }

    pub fn with_enrichment_timeout(mut self, timeout: Duration) -> Self {
        self.enrichment_timeout = timeout;
        self
    }

    pub fn with_category(mut self, category: PoiCategory) -> Self {
        self.category = category;
        self
    }
}
