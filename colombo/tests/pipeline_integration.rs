//! Integration tests for the discovery and playback pipeline.
//!
//! These tests drive the public API end to end with in-process fakes:
//! - Landmark search → article filter → ranked list → narration → playback
//! - Trigger coalescing while a discovery cycle is running
//! - Refresh and source failure handling in the background worker
//!
//! Run with: `cargo test --test pipeline_integration`

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use colombo::coord::Coordinate;
use colombo::discovery::{DiscoveryConfig, DiscoveryStatus, LandmarkDiscoveryEngine};
use colombo::geosearch::{GeoArticle, GeosearchClient, GeosearchError};
use colombo::landmark::{LandmarkCandidate, LandmarkSource, LandmarkSourceError, PoiCategory};
use colombo::narration::{NarrationError, NarrationRequest, NarrationResult, NarrationService};
use colombo::playback::{
    AudioBackend, AudioError, AudioTrack, ClockTrack, PlaybackConfig, PlaybackController,
    PlaybackEvent, PlaybackState,
};
use colombo::provider::{BoxFuture, ProviderError, TransportError};

// ============================================================================
// Fakes
// ============================================================================

/// Landmark source with a fixed result and an optional gate that holds each
/// search until a permit is released.
struct FixedSource {
    result: Result<Vec<LandmarkCandidate>, LandmarkSourceError>,
    gate: Option<Arc<Semaphore>>,
    calls: Mutex<Vec<Coordinate>>,
}

impl FixedSource {
    fn new(candidates: Vec<LandmarkCandidate>) -> Self {
        Self {
            result: Ok(candidates),
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn gated(candidates: Vec<LandmarkCandidate>, gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(candidates)
        }
    }

    fn failing() -> Self {
        Self {
            result: Err(ProviderError::from(TransportError::Timeout).into()),
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Coordinate> {
        self.calls.lock().clone()
    }
}

impl LandmarkSource for FixedSource {
    fn search_nearby(
        &self,
        coordinate: Coordinate,
        _radius_meters: f64,
        _category: PoiCategory,
    ) -> BoxFuture<'_, Result<Vec<LandmarkCandidate>, LandmarkSourceError>> {
        self.calls.lock().push(coordinate);
        Box::pin(async move {
            if let Some(gate) = &self.gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
            self.result.clone()
        })
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Article index that knows articles at a set of coordinates.
struct ArticleIndex {
    articles: Vec<(Coordinate, &'static str)>,
}

impl GeosearchClient for ArticleIndex {
    fn fetch_nearby(
        &self,
        coordinate: Coordinate,
        radius_meters: f64,
        limit: u32,
    ) -> BoxFuture<'_, Result<Vec<GeoArticle>, GeosearchError>> {
        let found: Vec<GeoArticle> = self
            .articles
            .iter()
            .filter(|(at, _)| at.distance_to(&coordinate) <= radius_meters)
            .take(limit as usize)
            .enumerate()
            .map(|(i, (at, title))| GeoArticle {
                page_id: i as i64 + 1,
                title: title.to_string(),
                coordinate: *at,
                distance_meters: at.distance_to(&coordinate),
            })
            .collect();
        Box::pin(async move { Ok(found) })
    }
}

struct StaticNarration;

impl NarrationService for StaticNarration {
    fn request_narration<'a>(
        &'a self,
        request: &'a NarrationRequest,
    ) -> BoxFuture<'a, Result<NarrationResult, NarrationError>> {
        let result = NarrationResult {
            place_name: request.landmark.name().to_string(),
            subtitle: Some("Champ de Mars".to_string()),
            story_text: "Built for the 1889 World's Fair...".to_string(),
            audio_uri: "https://cdn.example.com/eiffel.mp3".to_string(),
        };
        Box::pin(async move { Ok(result) })
    }
}

struct ClockAudio {
    duration: f64,
}

impl AudioBackend for ClockAudio {
    fn open<'a>(&'a self, _uri: &'a str) -> BoxFuture<'a, Result<Box<dyn AudioTrack>, AudioError>> {
        let track: Box<dyn AudioTrack> = Box::new(ClockTrack::new(self.duration));
        Box::pin(async move { Ok(track) })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn eiffel() -> Coordinate {
    Coordinate::new(48.8584, 2.2945).unwrap()
}

/// A point `meters` north of the Eiffel Tower.
fn north(meters: f64) -> Coordinate {
    Coordinate::new(eiffel().latitude + meters / 111_195.0, eiffel().longitude).unwrap()
}

fn champ_de_mars() -> Vec<LandmarkCandidate> {
    vec![
        LandmarkCandidate::new("node/statue", "Statue", north(35.0)),
        LandmarkCandidate::new("node/kiosk", "Kiosk", north(20.0)),
        LandmarkCandidate::new("way/5013364", "Eiffel Tower", eiffel()),
        LandmarkCandidate::new("way/museum", "Far Museum", north(200.0)),
    ]
}

fn article_index() -> ArticleIndex {
    ArticleIndex {
        articles: vec![
            (eiffel(), "Eiffel Tower"),
            (north(35.0), "Statue"),
            (north(200.0), "Far Museum"),
        ],
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

// ============================================================================
// Integration Tests
// ============================================================================

/// A user standing under the Eiffel Tower gets a ranked list, selects the
/// nearest landmark and hears its story to the end.
#[tokio::test(start_paused = true)]
async fn test_eiffel_tower_round_trip() {
    let engine = LandmarkDiscoveryEngine::new(
        Arc::new(FixedSource::new(champ_de_mars())),
        Arc::new(article_index()),
        DiscoveryConfig::default(),
    );

    let report = engine.run_cycle(eiffel()).await;

    assert_eq!(report.status, DiscoveryStatus::Ready);
    assert_eq!(report.candidates, 3, "Far Museum is outside the radius");
    let ids: Vec<&str> = report.landmarks.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["way/5013364", "node/statue"]);
    assert!(report.landmarks[0].distance_from_user < 1.0);
    assert!((report.landmarks[1].distance_from_user - 35.0).abs() < 0.5);

    let shutdown = CancellationToken::new();
    let (playback, task) = PlaybackController::spawn(
        Arc::new(StaticNarration),
        Arc::new(ClockAudio { duration: 3.0 }),
        PlaybackConfig::default(),
        shutdown.clone(),
    );
    let mut events = playback.events();

    let selected = report.landmarks[0].clone();
    playback
        .play(NarrationRequest::new(selected).with_language("en"))
        .unwrap();

    let mut states = Vec::new();
    let finished = loop {
        match events.recv().await.unwrap() {
            PlaybackEvent::StateChanged { to, .. } => states.push(to),
            PlaybackEvent::Finished { landmark_id } => break landmark_id,
            PlaybackEvent::NarrationReady(result) => {
                assert_eq!(result.place_name, "Eiffel Tower");
            }
        }
    };

    assert_eq!(finished.as_deref(), Some("way/5013364"));
    assert_eq!(
        states,
        vec![
            PlaybackState::GeneratingStory,
            PlaybackState::PreparingAudio,
            PlaybackState::Playing,
            PlaybackState::Finished,
        ]
    );

    playback
        .subscribe()
        .wait_for(|s| s.state == PlaybackState::Idle)
        .await
        .unwrap();
    assert_eq!(playback.session().narration, None);

    shutdown.cancel();
    task.await.unwrap();
}

/// Triggers arriving while a cycle runs collapse into one follow-up cycle
/// at the most recent coordinate.
#[tokio::test]
async fn test_triggers_during_cycle_coalesce_to_latest() {
    let gate = Arc::new(Semaphore::new(0));
    let source = Arc::new(FixedSource::gated(champ_de_mars(), Arc::clone(&gate)));
    let engine = LandmarkDiscoveryEngine::new(
        Arc::clone(&source) as Arc<dyn LandmarkSource>,
        Arc::new(article_index()),
        DiscoveryConfig::default(),
    );

    let shutdown = CancellationToken::new();
    let (handle, task) = engine.spawn(shutdown.clone());
    let mut snapshots = handle.subscribe();

    let (c1, c2, c3) = (eiffel(), north(10.0), north(20.0));

    handle.trigger(c1);
    wait_until(|| source.calls().len() == 1).await;

    handle.trigger(c2);
    handle.trigger(c3);
    gate.add_permits(10);

    snapshots.wait_for(|s| s.cycle == 2).await.unwrap();
    assert_eq!(source.calls(), vec![c1, c3]);
    assert_eq!(handle.snapshot().origin, Some(c3));
    assert_eq!(handle.latest_position(), Some(c3));

    // No third cycle is pending.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(source.calls().len(), 2);

    shutdown.cancel();
    task.await.unwrap();
}

/// Refresh clears the published list and searches again at the last
/// known position.
#[tokio::test]
async fn test_refresh_clears_then_repopulates() {
    let gate = Arc::new(Semaphore::new(1));
    let source = Arc::new(FixedSource::gated(champ_de_mars(), Arc::clone(&gate)));
    let engine = LandmarkDiscoveryEngine::new(
        Arc::clone(&source) as Arc<dyn LandmarkSource>,
        Arc::new(article_index()),
        DiscoveryConfig::default(),
    );

    let shutdown = CancellationToken::new();
    let (handle, task) = engine.spawn(shutdown.clone());
    let mut snapshots = handle.subscribe();

    assert!(!handle.refresh(), "nothing to refresh before the first fix");

    handle.trigger(eiffel());
    snapshots.wait_for(|s| s.cycle == 1).await.unwrap();
    assert_eq!(handle.snapshot().landmarks.len(), 2);

    assert!(handle.refresh());
    snapshots
        .wait_for(|s| s.is_searching && s.landmarks.is_empty())
        .await
        .unwrap();

    gate.add_permits(1);
    let snapshot = snapshots.wait_for(|s| s.cycle == 2).await.unwrap().clone();
    assert_eq!(snapshot.landmarks.len(), 2);
    assert!(!snapshot.is_searching);
    assert_eq!(source.calls(), vec![eiffel(), eiffel()]);

    shutdown.cancel();
    task.await.unwrap();
}

/// A failing landmark source is reported in the snapshot and the worker
/// keeps serving later triggers.
#[tokio::test]
async fn test_source_failure_is_reported_not_fatal() {
    let engine = LandmarkDiscoveryEngine::new(
        Arc::new(FixedSource::failing()),
        Arc::new(article_index()),
        DiscoveryConfig::default(),
    );

    let shutdown = CancellationToken::new();
    let (handle, task) = engine.spawn(shutdown.clone());
    let mut snapshots = handle.subscribe();

    handle.trigger(eiffel());
    let snapshot = snapshots.wait_for(|s| s.cycle == 1).await.unwrap().clone();
    assert!(matches!(snapshot.status, DiscoveryStatus::SourceUnavailable(_)));
    assert!(snapshot.status.is_degraded());
    assert_eq!(
        snapshot.message(),
        "Network error. Please check your connection."
    );

    handle.trigger(north(10.0));
    snapshots.wait_for(|s| s.cycle == 2).await.unwrap();
    assert!(!task.is_finished());

    shutdown.cancel();
    task.await.unwrap();
}
