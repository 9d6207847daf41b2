//! Discovery output types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;
use crate::landmark::LandmarkCandidate;

/// A candidate confirmed to have at least one nearby article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Stable identifier, equal to the candidate's provider id.
    pub id: String,
    pub candidate: LandmarkCandidate,
    /// Distance from the coordinate that triggered the cycle, in meters.
    pub distance_from_user: f64,
}

impl Landmark {
    pub fn new(candidate: LandmarkCandidate, distance_from_user: f64) -> Self {
        Self {
            id: candidate.external_id.clone(),
            candidate,
            distance_from_user,
        }
    }

    pub fn name(&self) -> &str {
        &self.candidate.name
    }

    pub fn coordinate(&self) -> Coordinate {
        self.candidate.coordinate
    }
}

/// Outcome of the most recent discovery cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryStatus {
    /// No cycle has completed yet.
    Idle,
    /// At least one landmark was found.
    Ready,
    /// The landmark source returned nothing near the user.
    NoCandidates,
    /// Candidates existed but none had a nearby article.
    NoArticles,
    /// Every enrichment lookup failed; results are unreliable.
    Degraded { failed: usize },
    /// The landmark source itself failed.
    SourceUnavailable(String),
}

impl DiscoveryStatus {
    /// Returns true for outcomes a UI should flag as an error banner.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            DiscoveryStatus::Degraded { .. } | DiscoveryStatus::SourceUnavailable(_)
        )
    }
}

impl fmt::Display for DiscoveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryStatus::Idle => write!(f, "idle"),
            DiscoveryStatus::Ready => write!(f, "ready"),
            DiscoveryStatus::NoCandidates => write!(f, "no candidates"),
            DiscoveryStatus::NoArticles => write!(f, "no articles"),
            DiscoveryStatus::Degraded { failed } => write!(f, "degraded ({} lookups failed)", failed),
            DiscoveryStatus::SourceUnavailable(reason) => write!(f, "source unavailable: {}", reason),
        }
    }
}

/// Atomically published view of the landmark list.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSnapshot {
    /// Landmarks sorted ascending by `distance_from_user`.
    pub landmarks: Vec<Landmark>,
    pub status: DiscoveryStatus,
    /// Coordinate the list was computed for.
    pub origin: Option<Coordinate>,
    /// True while a cycle is running.
    pub is_searching: bool,
    /// Number of completed cycles.
    pub cycle: u64,
    pub search_radius_meters: f64,
}

impl LandmarkSnapshot {
    pub fn empty(search_radius_meters: f64) -> Self {
        Self {
            landmarks: Vec::new(),
            status: DiscoveryStatus::Idle,
            origin: None,
            is_searching: false,
            cycle: 0,
            search_radius_meters,
        }
    }

    pub fn find(&self, id: &str) -> Option<&Landmark> {
        self.landmarks.iter().find(|l| l.id == id)
    }

    /// Display string summarizing the snapshot.
    pub fn message(&self) -> String {
        if self.is_searching && self.landmarks.is_empty() {
            return "Searching for landmarks...".to_string();
        }
        match &self.status {
            DiscoveryStatus::Idle => "Waiting for location".to_string(),
            DiscoveryStatus::Ready => match self.landmarks.len() {
                1 => "1 landmark nearby".to_string(),
                n => format!("{} landmarks nearby", n),
            },
            DiscoveryStatus::NoCandidates | DiscoveryStatus::NoArticles => format!(
                "No landmarks with Wikipedia articles found within {} meters",
                self.search_radius_meters.round()
            ),
            DiscoveryStatus::Degraded { .. } => {
                "Article lookup unavailable. Results may be incomplete.".to_string()
            }
            DiscoveryStatus::SourceUnavailable(_) => {
                "Network error. Please check your connection.".to_string()
            }
        }
    }
}
