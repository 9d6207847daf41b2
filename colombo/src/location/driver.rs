//! Async event loop feeding a [`ProximityTracker`].

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::fix::LocationEvent;
use super::tracker::{FixDecision, ProximityTracker, TrackerStats, TrackerStatus};
use crate::coord::Coordinate;

/// Receives the tracker's output.
pub trait LocationSink: Send + Sync {
    /// A fix passed both gates; discovery should run here.
    fn location_emitted(&self, coordinate: Coordinate);

    /// A fix was accepted but suppressed by the throttle.
    fn position_observed(&self, _coordinate: Coordinate) {}
}

impl<T: LocationSink + ?Sized> LocationSink for std::sync::Arc<T> {
    fn location_emitted(&self, coordinate: Coordinate) {
        (**self).location_emitted(coordinate)
    }

    fn position_observed(&self, coordinate: Coordinate) {
        (**self).position_observed(coordinate)
    }
}

/// Runs the tracker until the event channel closes or `shutdown` fires.
///
/// Events are processed strictly in arrival order. Status changes are
/// published on `status_tx`. The tracker is stopped before returning.
pub async fn run_tracker<S: LocationSink>(
    mut tracker: ProximityTracker,
    mut events: mpsc::Receiver<LocationEvent>,
    sink: S,
    status_tx: watch::Sender<TrackerStatus>,
    shutdown: CancellationToken,
) -> TrackerStats {
    tracing::info!(
        movement_threshold_m = tracker.config().movement_threshold_meters,
        min_fetch_interval_ms = tracker.config().min_fetch_interval.as_millis() as u64,
        "Proximity tracker started"
    );
    status_tx.send_replace(tracker.status());

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            event = events.recv() => {
                let Some(event) = event else { break };

                match event {
                    LocationEvent::Fix(fix) => match tracker.on_fix(&fix) {
                        FixDecision::Emit(coordinate) => sink.location_emitted(coordinate),
                        FixDecision::Suppressed(_) if tracker.status().accepts_fixes() => {
                            sink.position_observed(fix.coordinate)
                        }
                        FixDecision::Suppressed(_) => {}
                    },
                    LocationEvent::Error(err) => {
                        tracker.on_error(err);
                    }
                    LocationEvent::Authorization(auth) => {
                        tracker.on_authorization(auth);
                    }
                }

                status_tx.send_if_modified(|current| {
                    let next = tracker.status();
                    let changed = *current != next;
                    *current = next;
                    changed
                });
            }
        }
    }

    tracker.stop();
    status_tx.send_replace(TrackerStatus::Stopped);

    let stats = tracker.stats();
    tracing::info!(
        fixes = stats.fixes_received,
        emitted = stats.emitted,
        suppressed = stats.suppressed,
        "Proximity tracker stopped"
    );
    stats
}
