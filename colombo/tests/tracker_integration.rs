//! Integration tests for the proximity tracker.
//!
//! These tests cover the throttle and its async driver:
//! - A walking user triggers discovery only after moving and waiting
//! - Permission loss blocks emission until access is granted again
//! - The driver forwards emitted and observed positions to its sink
//!
//! Run with: `cargo test --test tracker_integration`

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use colombo::coord::Coordinate;
use colombo::location::{
    run_tracker, AuthorizationStatus, FixDecision, LocationError, LocationEvent, LocationFix,
    LocationSink, ProximityTracker, SuppressReason, TrackerConfig, TrackerStatus,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn origin() -> Coordinate {
    Coordinate::new(51.5007, -0.1246).unwrap()
}

/// A point `meters` east of the origin.
fn east(meters: f64) -> Coordinate {
    let origin = origin();
    let meters_per_degree = 111_195.0 * origin.latitude.to_radians().cos();
    Coordinate::new(origin.latitude, origin.longitude + meters / meters_per_degree).unwrap()
}

fn fix_at(coordinate: Coordinate, base: Instant, millis: u64) -> LocationFix {
    LocationFix::new(coordinate, base + Duration::from_millis(millis))
}

#[derive(Default)]
struct RecordingSink {
    emitted: Mutex<Vec<Coordinate>>,
    observed: Mutex<Vec<Coordinate>>,
}

impl LocationSink for RecordingSink {
    fn location_emitted(&self, coordinate: Coordinate) {
        self.emitted.lock().push(coordinate);
    }

    fn position_observed(&self, coordinate: Coordinate) {
        self.observed.lock().push(coordinate);
    }
}

// ============================================================================
// Throttle
// ============================================================================

/// Small moves within one second of each other collapse into one trigger.
#[test]
fn test_jitter_emits_once() {
    let mut tracker = ProximityTracker::with_defaults();
    let base = Instant::now();

    assert!(tracker.on_fix(&fix_at(origin(), base, 0)).is_emit());
    let decision = tracker.on_fix(&fix_at(east(2.0), base, 400));
    assert!(matches!(
        decision,
        FixDecision::Suppressed(SuppressReason::BelowMovementThreshold { .. })
    ));
    assert!(!tracker.on_fix(&fix_at(east(1.0), base, 900)).is_emit());

    let stats = tracker.stats();
    assert_eq!(stats.fixes_received, 3);
    assert_eq!(stats.emitted, 1);
    assert_eq!(stats.suppressed, 2);
    assert_eq!(tracker.last_emitted(), Some(origin()));
    assert_eq!(tracker.latest_position(), Some(east(1.0)));
}

/// Both gates must pass: distance alone is not enough inside the interval.
#[test]
fn test_walk_requires_distance_and_time() {
    let config = TrackerConfig::default();
    let mut tracker = ProximityTracker::new(config);
    let base = Instant::now();

    assert!(tracker.on_fix(&fix_at(origin(), base, 0)).is_emit());

    // Far enough but too soon.
    let decision = tracker.on_fix(&fix_at(east(30.0), base, 500));
    assert!(matches!(
        decision,
        FixDecision::Suppressed(SuppressReason::RateLimited { .. })
    ));

    // Far enough and late enough.
    assert_eq!(
        tracker.on_fix(&fix_at(east(30.0), base, 1_200)),
        FixDecision::Emit(east(30.0))
    );

    // Late enough but not far enough from the new anchor.
    assert!(!tracker.on_fix(&fix_at(east(33.0), base, 5_000)).is_emit());
    assert_eq!(tracker.stats().emitted, 2);
}

/// Revoked access blocks emission; a re-grant resets the gates so the next
/// fix is emitted even if it is close to the last one.
#[test]
fn test_permission_denied_blocks_until_regranted() {
    let mut tracker = ProximityTracker::with_defaults();
    let base = Instant::now();

    tracker.on_authorization(AuthorizationStatus::Authorized);
    assert!(tracker.on_fix(&fix_at(origin(), base, 0)).is_emit());

    assert_eq!(
        tracker.on_error(LocationError::PermissionDenied),
        TrackerStatus::Blocked
    );
    assert_eq!(
        tracker.status_message(),
        "Location access denied. Please enable it in Settings."
    );
    assert!(!tracker.on_fix(&fix_at(east(50.0), base, 5_000)).is_emit());

    assert_eq!(
        tracker.on_authorization(AuthorizationStatus::Authorized),
        TrackerStatus::Tracking
    );
    assert!(tracker.on_fix(&fix_at(origin(), base, 5_100)).is_emit());
}

/// A transient error keeps the tracker running.
#[test]
fn test_transient_error_keeps_tracking() {
    let mut tracker = ProximityTracker::with_defaults();
    let base = Instant::now();

    assert!(tracker.on_fix(&fix_at(origin(), base, 0)).is_emit());
    assert_eq!(
        tracker.on_error(LocationError::LocationUnknown),
        TrackerStatus::Tracking
    );
    assert!(tracker.on_fix(&fix_at(east(20.0), base, 2_000)).is_emit());
}

// ============================================================================
// Async Driver
// ============================================================================

#[tokio::test]
async fn test_driver_forwards_to_sink() {
    let (tx, rx) = mpsc::channel(16);
    let (status_tx, mut status_rx) = watch::channel(TrackerStatus::Waiting);
    let sink = Arc::new(RecordingSink::default());
    let shutdown = CancellationToken::new();

    let driver = tokio::spawn(run_tracker(
        ProximityTracker::with_defaults(),
        rx,
        Arc::clone(&sink),
        status_tx,
        shutdown.clone(),
    ));

    let base = Instant::now();
    let events: Vec<LocationEvent> = vec![
        AuthorizationStatus::Authorized.into(),
        fix_at(origin(), base, 0).into(),
        fix_at(east(2.0), base, 300).into(),
        fix_at(east(40.0), base, 1_500).into(),
    ];
    for event in events {
        tx.send(event).await.unwrap();
    }

    status_rx
        .wait_for(|s| *s == TrackerStatus::Tracking)
        .await
        .unwrap();

    drop(tx);
    let stats = driver.await.unwrap();

    assert_eq!(*sink.emitted.lock(), vec![origin(), east(40.0)]);
    assert_eq!(*sink.observed.lock(), vec![east(2.0)]);
    assert_eq!(stats.fixes_received, 3);
    assert_eq!(stats.emitted, 2);
    assert_eq!(*status_rx.borrow(), TrackerStatus::Stopped);
}

#[tokio::test]
async fn test_driver_reports_blocked_and_stops_on_shutdown() {
    let (tx, rx) = mpsc::channel(16);
    let (status_tx, mut status_rx) = watch::channel(TrackerStatus::Waiting);
    let sink = Arc::new(RecordingSink::default());
    let shutdown = CancellationToken::new();

    let driver = tokio::spawn(run_tracker(
        ProximityTracker::with_defaults(),
        rx,
        Arc::clone(&sink),
        status_tx,
        shutdown.clone(),
    ));

    tx.send(AuthorizationStatus::Denied.into()).await.unwrap();
    status_rx
        .wait_for(|s| *s == TrackerStatus::Blocked)
        .await
        .unwrap();

    tx.send(LocationFix::now(origin()).into()).await.unwrap();

    shutdown.cancel();
    let stats = driver.await.unwrap();

    assert!(sink.emitted.lock().is_empty());
    assert!(sink.observed.lock().is_empty());
    assert_eq!(stats.emitted, 0);
    assert_eq!(*status_rx.borrow(), TrackerStatus::Stopped);
}
