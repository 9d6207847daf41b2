//! One discovery cycle: search, filter, rank, enrich.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use super::config::DiscoveryConfig;
use super::model::{DiscoveryStatus, Landmark};
use crate::coord::Coordinate;
use crate::geosearch::GeosearchClient;
use crate::landmark::{LandmarkCandidate, LandmarkSource, LandmarkSourceError};

/// Result of a single discovery cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryReport {
    pub origin: Coordinate,
    /// Confirmed landmarks, nearest first.
    pub landmarks: Vec<Landmark>,
    pub status: DiscoveryStatus,
    /// Candidates that survived the radius re-check.
    pub candidates: usize,
    /// Enrichment lookups that failed or timed out.
    pub enrichment_failures: usize,
}

impl DiscoveryReport {
    fn empty(origin: Coordinate, status: DiscoveryStatus) -> Self {
        Self {
            origin,
            landmarks: Vec::new(),
            status,
            candidates: 0,
            enrichment_failures: 0,
        }
    }
}

enum Enrichment {
    Confirmed,
    NoArticle,
    Failed,
}

/// Runs discovery cycles against a landmark source and a geosearch client.
///
/// The engine itself holds no mutable state; [`spawn`](Self::spawn) wraps
/// it in a worker that owns the published list.
pub struct LandmarkDiscoveryEngine {
    source: Arc<dyn LandmarkSource>,
    geosearch: Arc<dyn GeosearchClient>,
    config: DiscoveryConfig,
}

impl LandmarkDiscoveryEngine {
    pub fn new(
        source: Arc<dyn LandmarkSource>,
        geosearch: Arc<dyn GeosearchClient>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            source,
            geosearch,
            config,
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Runs one cycle for `origin`.
    ///
    /// Provider failures never escape: they are folded into the report's
    /// status. The returned list is complete; nothing is published while
    /// enrichment is still running.
    pub async fn run_cycle(&self, origin: Coordinate) -> DiscoveryReport {
        let radius = self.config.search_radius_meters;

        let candidates = match self
            .source
            .search_nearby(origin, radius, self.config.category)
            .await
        {
            Ok(candidates) => candidates,
            Err(LandmarkSourceError::NoResults) => Vec::new(),
            Err(LandmarkSourceError::Provider(err)) => {
                tracing::warn!(
                    source = self.source.name(),
                    error = %err,
                    "Landmark search failed"
                );
                return DiscoveryReport::empty(
                    origin,
                    DiscoveryStatus::SourceUnavailable(err.to_string()),
                );
            }
        };

        let ranked = rank_candidates(origin, candidates, radius);
        if ranked.is_empty() {
            tracing::debug!(origin = %origin, radius_m = radius, "No candidates nearby");
            return DiscoveryReport::empty(origin, DiscoveryStatus::NoCandidates);
        }

        let total = ranked.len();
        let outcomes: Vec<(LandmarkCandidate, f64, Enrichment)> = stream::iter(ranked)
            .map(|(candidate, distance)| async move {
                let outcome = self.enrich(&candidate).await;
                (candidate, distance, outcome)
            })
            .buffered(self.config.enrichment_concurrency.max(1))
            .collect()
            .await;

        let mut failures = 0;
        let mut landmarks = Vec::new();
        for (candidate, distance, outcome) in outcomes {
            match outcome {
                Enrichment::Confirmed => landmarks.push(Landmark::new(candidate, distance)),
                Enrichment::NoArticle => {}
                Enrichment::Failed => failures += 1,
            }
        }

        let status = if failures == total {
            tracing::warn!(failed = failures, "All article lookups failed");
            DiscoveryStatus::Degraded { failed: failures }
        } else if landmarks.is_empty() {
            DiscoveryStatus::NoArticles
        } else {
            DiscoveryStatus::Ready
        };

        tracing::info!(
            origin = %origin,
            candidates = total,
            landmarks = landmarks.len(),
            enrichment_failures = failures,
            status = %status,
            "Discovery cycle complete"
        );

        DiscoveryReport {
            origin,
            landmarks,
            status,
            candidates: total,
            enrichment_failures: failures,
        }
    }

    async fn enrich(&self, candidate: &LandmarkCandidate) -> Enrichment {
        let lookup = self.geosearch.fetch_nearby(
            candidate.coordinate,
            self.config.article_radius_meters,
            self.config.article_limit,
        );

        match tokio::time::timeout(self.config.enrichment_timeout, lookup).await {
            Ok(Ok(articles)) if !articles.is_empty() => Enrichment::Confirmed,
            Ok(Ok(_)) => Enrichment::NoArticle,
            Ok(Err(err)) => {
                tracing::debug!(candidate = %candidate.name, error = %err, "Article lookup failed");
                Enrichment::Failed
            }
            Err(_) => {
                tracing::debug!(candidate = %candidate.name, "Article lookup timed out");
                Enrichment::Failed
            }
        }
    }
}

/// Drops candidates outside `radius_meters` of `origin` and sorts the rest
/// nearest first, pairing each with its distance.
pub fn rank_candidates(
    origin: Coordinate,
    candidates: Vec<LandmarkCandidate>,
    radius_meters: f64,
) -> Vec<(LandmarkCandidate, f64)> {
    let mut ranked: Vec<(LandmarkCandidate, f64)> = candidates
        .into_iter()
        .map(|c| {
            let distance = origin.distance_to(&c.coordinate);
            (c, distance)
        })
        .filter(|(_, distance)| *distance <= radius_meters)
        .collect();

    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}
