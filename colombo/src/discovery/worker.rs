//! Background worker owning the published landmark list.
//!
//! Triggers are coalesced through a single pending slot: while a cycle is
//! running, any number of triggers collapse into one follow-up cycle at the
//! most recent coordinate.
//!
//! ```text
//!   trigger(c1)   trigger(c2) trigger(c3)
//!       |              |          |
//!       v              v          v
//!   [ cycle(c1) ..................... ][ cycle(c3) ]
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::engine::LandmarkDiscoveryEngine;
use super::model::{Landmark, LandmarkSnapshot};
use crate::coord::Coordinate;
use crate::location::LocationSink;

#[derive(Debug, Default)]
struct Pending {
    coordinate: Option<Coordinate>,
    clear_first: bool,
}

#[derive(Debug, Default)]
struct Shared {
    pending: Mutex<Pending>,
    latest: Mutex<Option<Coordinate>>,
    wake: Notify,
}

/// Cloneable handle for triggering discovery and reading its output.
#[derive(Clone)]
pub struct DiscoveryHandle {
    shared: Arc<Shared>,
    snapshots: watch::Receiver<LandmarkSnapshot>,
}

impl DiscoveryHandle {
    /// Requests a cycle at `coordinate`.
    ///
    /// Never blocks. If a cycle is running, the request replaces any
    /// previously pending one.
    pub fn trigger(&self, coordinate: Coordinate) {
        *self.shared.latest.lock() = Some(coordinate);
        self.shared.pending.lock().coordinate = Some(coordinate);
        self.shared.wake.notify_one();
    }

    /// Clears the published list and re-runs discovery at the latest known
    /// position. Returns false if no position is known yet.
    pub fn refresh(&self) -> bool {
        let Some(coordinate) = *self.shared.latest.lock() else {
            return false;
        };
        {
            let mut pending = self.shared.pending.lock();
            pending.coordinate = Some(coordinate);
            pending.clear_first = true;
        }
        self.shared.wake.notify_one();
        true
    }

    /// Records a position without triggering a cycle.
    pub fn record_position(&self, coordinate: Coordinate) {
        *self.shared.latest.lock() = Some(coordinate);
    }

    pub fn latest_position(&self) -> Option<Coordinate> {
        *self.shared.latest.lock()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> LandmarkSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Subscribes to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<LandmarkSnapshot> {
        self.snapshots.clone()
    }

    /// Looks up a landmark in the current snapshot.
    pub fn find(&self, id: &str) -> Option<Landmark> {
        self.snapshots.borrow().find(id).cloned()
    }
}

impl LocationSink for DiscoveryHandle {
    fn location_emitted(&self, coordinate: Coordinate) {
        self.trigger(coordinate);
    }

    fn position_observed(&self, coordinate: Coordinate) {
        self.record_position(coordinate);
    }
}

impl LandmarkDiscoveryEngine {
    /// Moves the engine onto a background task.
    ///
    /// The task runs until `shutdown` is cancelled. A cycle in progress at
    /// cancellation is abandoned without publishing.
    pub fn spawn(self, shutdown: CancellationToken) -> (DiscoveryHandle, JoinHandle<()>) {
        let (snapshot_tx, snapshot_rx) =
            watch::channel(LandmarkSnapshot::empty(self.config().search_radius_meters));
        let shared = Arc::new(Shared::default());

        let task = tokio::spawn(run_worker(self, Arc::clone(&shared), snapshot_tx, shutdown));

        (
            DiscoveryHandle {
                shared,
                snapshots: snapshot_rx,
            },
            task,
        )
    }
}

async fn run_worker(
    engine: LandmarkDiscoveryEngine,
    shared: Arc<Shared>,
    snapshot_tx: watch::Sender<LandmarkSnapshot>,
    shutdown: CancellationToken,
) {
    tracing::debug!("Discovery worker started");

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            _ = shared.wake.notified() => {}
        }

        let (origin, clear_first) = {
            let mut pending = shared.pending.lock();
            let clear_first = std::mem::take(&mut pending.clear_first);
            match pending.coordinate.take() {
                Some(c) => (c, clear_first),
                None => continue,
            }
        };

        snapshot_tx.send_modify(|snapshot| {
            snapshot.is_searching = true;
            if clear_first {
                snapshot.landmarks.clear();
            }
        });

        let report = tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            report = engine.run_cycle(origin) => report,
        };

        snapshot_tx.send_modify(|snapshot| {
            snapshot.landmarks = report.landmarks;
            snapshot.status = report.status;
            snapshot.origin = Some(report.origin);
            snapshot.is_searching = false;
            snapshot.cycle += 1;
        });
    }

    snapshot_tx.send_modify(|snapshot| snapshot.is_searching = false);
    tracing::debug!("Discovery worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::engine::tests::{ScriptedGeosearch, StaticSource};
    use crate::discovery::{DiscoveryConfig, DiscoveryStatus};
    use crate::geosearch::GeosearchClient;
    use crate::landmark::{LandmarkCandidate, LandmarkSource};

    fn eiffel() -> Coordinate {
        Coordinate::new(48.8584, 2.2945).unwrap()
    }

    fn spawn_with(
        source: Arc<dyn LandmarkSource>,
        geosearch: Arc<dyn GeosearchClient>,
    ) -> (DiscoveryHandle, JoinHandle<()>, CancellationToken) {
        let shutdown = CancellationToken::new();
        let engine = LandmarkDiscoveryEngine::new(source, geosearch, DiscoveryConfig::default());
        let (handle, task) = engine.spawn(shutdown.clone());
        (handle, task, shutdown)
    }

    #[tokio::test]
    async fn test_trigger_publishes_snapshot() {
        let source = Arc::new(StaticSource::new(vec![LandmarkCandidate::new(
            "way/1",
            "Eiffel Tower",
            eiffel(),
        )]));
        let geosearch = Arc::new(ScriptedGeosearch {
            with_article: vec![eiffel()],
            ..Default::default()
        });
        let (handle, task, shutdown) = spawn_with(source, geosearch);
        let mut rx = handle.subscribe();

        handle.trigger(eiffel());
        rx.wait_for(|s| s.cycle == 1).await.unwrap();

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.status, DiscoveryStatus::Ready);
        assert_eq!(snapshot.origin, Some(eiffel()));
        assert!(!snapshot.is_searching);
        assert_eq!(handle.find("way/1").unwrap().name(), "Eiffel Tower");

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_without_position_is_rejected() {
        let (handle, task, shutdown) = spawn_with(
            Arc::new(StaticSource::new(vec![])),
            Arc::new(ScriptedGeosearch::default()),
        );

        assert!(!handle.refresh());

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_reruns_at_latest_position() {
        let source = Arc::new(StaticSource::new(vec![]));
        let (handle, task, shutdown) =
            spawn_with(source.clone(), Arc::new(ScriptedGeosearch::default()));
        let mut rx = handle.subscribe();

        handle.trigger(eiffel());
        rx.wait_for(|s| s.cycle == 1).await.unwrap();

        let moved = Coordinate::new(48.8585, 2.2945).unwrap();
        handle.position_observed(moved);
        assert!(handle.refresh());
        rx.wait_for(|s| s.cycle == 2).await.unwrap();

        assert_eq!(*source.calls.lock(), vec![eiffel(), moved]);
        assert_eq!(handle.snapshot().status, DiscoveryStatus::NoCandidates);

        shutdown.cancel();
        task.await.unwrap();
    }
}
