//! Proximity tracker configuration.

use std::time::Duration;

/// Default distance a fix must move from the last emitted position, in meters.
pub const DEFAULT_MOVEMENT_THRESHOLD_METERS: f64 = 5.0;

/// Default minimum time between two emissions.
pub const DEFAULT_MIN_FETCH_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for [`ProximityTracker`](super::ProximityTracker).
///
/// Both gates must pass for a fix to be emitted: the distance gate
/// (`movement_threshold_meters`) and the rate gate (`min_fetch_interval`).
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Distance a fix must exceed from the last emitted position.
    pub movement_threshold_meters: f64,

    /// Minimum time between two emissions.
    pub min_fetch_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            movement_threshold_meters: DEFAULT_MOVEMENT_THRESHOLD_METERS,
            min_fetch_interval: DEFAULT_MIN_FETCH_INTERVAL,
        }
    }
}

impl TrackerConfig {
    pub fn with_movement_threshold(mut self, meters: f64) -> Self {
        self.movement_threshold_meters = meters;
        self
    }

    pub fn with_min_fetch_interval(mut self, interval: Duration) -> Self {
        self.min_fetch_interval = interval;
        self
    }
}
