//! Dual-gate throttle over incoming location fixes.
//!
//! # State Machine
//!
//! ```text
//!            Authorized / first fix
//!   Waiting ------------------------> Tracking
//!      |                               |   ^
//!      | Denied, Restricted,           |   | Authorized
//!      | PermissionDenied              v   |
//!      +------------------------------> Blocked
//!
//!   any state --stop()--> Stopped (terminal, idempotent)
//! ```
//!
//! While `Waiting` or `Tracking`, a fix is emitted only when it passes both
//! gates: it has moved more than the movement threshold from the last
//! emitted position, and at least the minimum fetch interval has elapsed
//! since the last emission. The first fix after construction or after a
//! re-grant is always emitted.

use std::fmt;
use std::time::{Duration, Instant};

use super::config::TrackerConfig;
use super::fix::{AuthorizationStatus, LocationError, LocationFix};
use crate::coord::Coordinate;

/// Externally visible tracker status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStatus {
    /// No fix received and no authorization decision yet.
    Waiting,
    /// Receiving and throttling fixes.
    Tracking,
    /// Location access denied or restricted.
    Blocked,
    /// Updates were stopped by the owner.
    Stopped,
}

impl TrackerStatus {
    /// Returns true if fixes are currently accepted.
    pub fn accepts_fixes(&self) -> bool {
        matches!(self, TrackerStatus::Waiting | TrackerStatus::Tracking)
    }

    /// Human-readable description for display.
    pub fn message(&self) -> &'static str {
        match self {
            TrackerStatus::Waiting => "Waiting for location",
            TrackerStatus::Tracking => "Tracking location",
            TrackerStatus::Blocked => "Location access denied. Please enable it in Settings.",
            TrackerStatus::Stopped => "Location updates stopped",
        }
    }
}

impl fmt::Display for TrackerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrackerStatus::Waiting => "waiting",
            TrackerStatus::Tracking => "tracking",
            TrackerStatus::Blocked => "blocked",
            TrackerStatus::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Why a fix did not produce an emission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SuppressReason {
    /// The fix is within the movement threshold of the last emission.
    BelowMovementThreshold { distance_meters: f64 },
    /// The minimum fetch interval has not elapsed.
    RateLimited { remaining: Duration },
    /// The tracker is blocked or stopped.
    Inactive(TrackerStatus),
}

/// Result of feeding a fix to the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixDecision {
    /// Downstream discovery should run at this coordinate.
    Emit(Coordinate),
    Suppressed(SuppressReason),
}

impl FixDecision {
    pub fn is_emit(&self) -> bool {
        matches!(self, FixDecision::Emit(_))
    }
}

/// Counters for logging and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub fixes_received: u64,
    pub emitted: u64,
    pub suppressed: u64,
    pub errors: u64,
}

/// Throttles a stream of location fixes into discovery triggers.
///
/// The tracker does no I/O and never blocks. All timing decisions use the
/// timestamp carried by each fix.
#[derive(Debug)]
pub struct ProximityTracker {
    config: TrackerConfig,
    status: TrackerStatus,
    last_emitted: Option<Coordinate>,
    last_fetch_time: Option<Instant>,
    latest_position: Option<Coordinate>,
    last_error: Option<LocationError>,
    stats: TrackerStats,
}

impl ProximityTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            status: TrackerStatus::Waiting,
            last_emitted: None,
            last_fetch_time: None,
            latest_position: None,
            last_error: None,
            stats: TrackerStats::default(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(TrackerConfig::default())
    }

    /// Processes a location fix.
    ///
    /// On emission `last_emitted` and `last_fetch_time` are updated before
    /// returning, so the caller can notify downstream knowing that a burst of
    /// follow-up fixes will be suppressed.
    pub fn on_fix(&mut self, fix: &LocationFix) -> FixDecision {
        self.stats.fixes_received += 1;

        if !self.status.accepts_fixes() {
            self.stats.suppressed += 1;
            return FixDecision::Suppressed(SuppressReason::Inactive(self.status));
        }

        self.status = TrackerStatus::Tracking;
        self.latest_position = Some(fix.coordinate);
        self.last_error = None;

        if let Some(reason) = self.suppress_reason(fix) {
            self.stats.suppressed += 1;
            tracing::trace!(coordinate = %fix.coordinate, ?reason, "Fix suppressed");
            return FixDecision::Suppressed(reason);
        }

        self.last_emitted = Some(fix.coordinate);
        self.last_fetch_time = Some(fix.timestamp);
        self.stats.emitted += 1;

        tracing::debug!(coordinate = %fix.coordinate, "Location emitted");
        FixDecision::Emit(fix.coordinate)
    }

    fn suppress_reason(&self, fix: &LocationFix) -> Option<SuppressReason> {
        // Cold start
        let last = self.last_emitted?;

        let distance_meters = last.distance_to(&fix.coordinate);
        if distance_meters <= self.config.movement_threshold_meters {
            return Some(SuppressReason::BelowMovementThreshold { distance_meters });
        }

        if let Some(last_fetch) = self.last_fetch_time {
            let elapsed = fix.timestamp.saturating_duration_since(last_fetch);
            if elapsed < self.config.min_fetch_interval {
                return Some(SuppressReason::RateLimited {
                    remaining: self.config.min_fetch_interval - elapsed,
                });
            }
        }

        None
    }

    /// Processes a provider error and returns the resulting status.
    pub fn on_error(&mut self, error: LocationError) -> TrackerStatus {
        self.stats.errors += 1;

        if self.status == TrackerStatus::Stopped {
            return self.status;
        }

        if error.is_terminal() {
            tracing::warn!(error = %error, "Location access lost");
            self.block();
        } else {
            tracing::info!(error = %error, "Transient location error");
        }

        self.last_error = Some(error);
        self.status
    }

    /// Processes an authorization change and returns the resulting status.
    pub fn on_authorization(&mut self, authorization: AuthorizationStatus) -> TrackerStatus {
        if self.status == TrackerStatus::Stopped {
            return self.status;
        }

        match authorization {
            AuthorizationStatus::NotDetermined => {
                if self.status != TrackerStatus::Blocked {
                    self.status = TrackerStatus::Waiting;
                }
            }
            AuthorizationStatus::Authorized => {
                if self.status == TrackerStatus::Blocked {
                    self.reset_gates();
                    self.last_error = None;
                }
                self.status = TrackerStatus::Tracking;
            }
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted => {
                self.block();
                self.last_error = Some(LocationError::PermissionDenied);
            }
        }

        tracing::debug!(%authorization, status = %self.status, "Authorization changed");
        self.status
    }

    /// Stops the tracker. Calling this more than once has no further effect.
    pub fn stop(&mut self) {
        if self.status != TrackerStatus::Stopped {
            tracing::debug!(stats = ?self.stats, "Proximity tracker stopped");
            self.status = TrackerStatus::Stopped;
        }
    }

    fn block(&mut self) {
        self.status = TrackerStatus::Blocked;
        self.reset_gates();
    }

    fn reset_gates(&mut self) {
        self.last_emitted = None;
        self.last_fetch_time = None;
    }

    pub fn status(&self) -> TrackerStatus {
        self.status
    }

    pub fn last_emitted(&self) -> Option<Coordinate> {
        self.last_emitted
    }

    pub fn last_fetch_time(&self) -> Option<Instant> {
        self.last_fetch_time
    }

    /// Most recent accepted position, emitted or not.
    pub fn latest_position(&self) -> Option<Coordinate> {
        self.latest_position
    }

    pub fn last_error(&self) -> Option<&LocationError> {
        self.last_error.as_ref()
    }

    /// Display string for the current state, preferring the last error.
    pub fn status_message(&self) -> String {
        match &self.last_error {
            Some(err) if self.status != TrackerStatus::Stopped => err.to_string(),
            _ => self.status.message().to_string(),
        }
    }

    pub fn stats(&self) -> TrackerStats {
        self.stats
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Fixes that each move further than the threshold and arrive after
        /// the interval always emit.
        #[test]
        fn spaced_fixes_always_emit(steps in proptest::collection::vec(0.0002f64..0.01, 1..20)) {
            let mut tracker = ProximityTracker::with_defaults();
            let start = Instant::now();
            let mut lat = 10.0;

            prop_assert!(tracker.on_fix(&LocationFix::new(
                Coordinate::new(lat, 20.0).unwrap(), start)).is_emit());

            for (i, step) in steps.iter().enumerate() {
                lat += step;
                let at = start + Duration::from_secs(2 * (i as u64 + 1));
                let fix = LocationFix::new(Coordinate::new(lat, 20.0).unwrap(), at);
                prop_assert!(tracker.on_fix(&fix).is_emit());
            }
            prop_assert_eq!(tracker.stats().emitted, steps.len() as u64 + 1);
        }

        /// Fixes that never leave the threshold radius of the first fix only
        /// emit once.
        #[test]
        fn jitter_emits_once(offsets in proptest::collection::vec(-0.00002f64..0.00002, 1..30)) {
            let mut tracker = ProximityTracker::with_defaults();
            let start = Instant::now();
            let base = Coordinate::new(10.0, 20.0).unwrap();

            tracker.on_fix(&LocationFix::new(base, start));
            for (i, offset) in offsets.iter().enumerate() {
                let at = start + Duration::from_secs(i as u64 + 1);
                let coordinate = Coordinate::new(base.latitude + offset, base.longitude).unwrap();
                prop_assert!(!tracker.on_fix(&LocationFix::new(coordinate, at)).is_emit());
            }
        }
    }
}
