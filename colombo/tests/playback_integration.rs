//! Integration tests for the playback controller.
//!
//! These tests exercise the state machine through its public handle:
//! - Narration backend rejection surfaces as `Failed` and clears on acknowledge
//! - Stop returns to `Idle` from every state, keeping the selected rate
//! - Seeking clamps to the track and is ignored without one
//!
//! Run with: `cargo test --test playback_integration`

use std::future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use colombo::coord::Coordinate;
use colombo::discovery::Landmark;
use colombo::landmark::LandmarkCandidate;
use colombo::narration::{
    HttpNarrationService, NarrationError, NarrationRequest, NarrationResult, NarrationService,
    SessionCredentials,
};
use colombo::playback::{
    AudioBackend, AudioError, AudioTrack, ClockTrack, PlaybackConfig, PlaybackController,
    PlaybackFailure, PlaybackSession, PlaybackState,
};
use colombo::provider::{
    BoxFuture, HttpClient, HttpMethod, HttpRequest, HttpResponse, TransportError,
};

// ============================================================================
// Fakes
// ============================================================================

/// HTTP client answering every request with one status code.
struct StatusClient {
    status: u16,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StatusClient {
    fn new(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

impl HttpClient for StatusClient {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        self.requests.lock().push(request);
        let response = HttpResponse::new(self.status, r#"{"message":"token expired"}"#);
        Box::pin(async move { Ok(response) })
    }
}

/// Narration service that either answers immediately, fails, or never
/// answers.
enum Narration {
    Ready,
    Fails(NarrationError),
    Held,
}

struct ScriptedNarration {
    mode: Narration,
    calls: AtomicUsize,
}

impl ScriptedNarration {
    fn new(mode: Narration) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: AtomicUsize::new(0),
        })
    }
}

impl NarrationService for ScriptedNarration {
    fn request_narration<'a>(
        &'a self,
        request: &'a NarrationRequest,
    ) -> BoxFuture<'a, Result<NarrationResult, NarrationError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            match &self.mode {
                Narration::Ready => Ok(NarrationResult {
                    place_name: request.landmark.name().to_string(),
                    subtitle: None,
                    story_text: "Once upon a time...".to_string(),
                    audio_uri: "https://cdn.example.com/story.mp3".to_string(),
                }),
                Narration::Fails(err) => Err(err.clone()),
                Narration::Held => future::pending().await,
            }
        })
    }
}

/// Audio backend opening clock tracks, or never finishing the download.
struct ScriptedAudio {
    duration: Option<f64>,
}

impl AudioBackend for ScriptedAudio {
    fn open<'a>(&'a self, _uri: &'a str) -> BoxFuture<'a, Result<Box<dyn AudioTrack>, AudioError>> {
        Box::pin(async move {
            match self.duration {
                Some(duration) => Ok(Box::new(ClockTrack::new(duration)) as Box<dyn AudioTrack>),
                None => future::pending().await,
            }
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn landmark() -> Landmark {
    let at = Coordinate::new(41.8902, 12.4922).unwrap();
    Landmark::new(LandmarkCandidate::new("way/colosseum", "Colosseum", at), 12.0)
}

fn spawn_controller(
    narration: Arc<dyn NarrationService>,
    audio: ScriptedAudio,
) -> (PlaybackController, JoinHandle<()>, CancellationToken) {
    let shutdown = CancellationToken::new();
    let config = PlaybackConfig::default().with_sample_interval(Duration::from_millis(20));
    let (controller, task) =
        PlaybackController::spawn(narration, Arc::new(audio), config, shutdown.clone());
    (controller, task, shutdown)
}

async fn wait_for(
    controller: &PlaybackController,
    mut predicate: impl FnMut(&PlaybackSession) -> bool,
) -> PlaybackSession {
    let mut rx = controller.subscribe();
    let session = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| predicate(s)))
        .await
        .expect("session did not reach the expected state")
        .unwrap()
        .clone();
    session
}

async fn wait_for_state(controller: &PlaybackController, state: PlaybackState) -> PlaybackSession {
    wait_for(controller, |s| s.state == state).await
}

// ============================================================================
// Narration Failures
// ============================================================================

/// The backend rejects the token: the session fails with an authentication
/// message and acknowledging it returns to Idle.
#[tokio::test]
async fn test_rejected_token_fails_then_acknowledges() {
    let client = StatusClient::new(401);
    let narration = HttpNarrationService::new(
        Arc::clone(&client),
        Arc::new(SessionCredentials::new(Some("expired-token".to_string()))),
    )
    .with_base_url("https://narration.example.com");

    let (controller, task, shutdown) =
        spawn_controller(Arc::new(narration), ScriptedAudio { duration: Some(5.0) });

    controller.play(NarrationRequest::new(landmark())).unwrap();

    let session = wait_for(&controller, |s| matches!(s.state, PlaybackState::Failed(_))).await;
    assert_eq!(
        session.state,
        PlaybackState::Failed(PlaybackFailure::Narration(NarrationError::Unauthorized))
    );
    assert_eq!(
        session.status_message(),
        "Authentication required. Please sign in again."
    );

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert!(requests[0].url.ends_with("/api/places/visit"));
    assert_eq!(
        requests[0].header("authorization"),
        Some("Bearer expired-token")
    );

    // Pause and resume do not leave Failed.
    controller.pause().unwrap();
    controller.resume().unwrap();
    controller.acknowledge().unwrap();
    let session = wait_for_state(&controller, PlaybackState::Idle).await;
    assert_eq!(session.landmark_id, None);

    shutdown.cancel();
    task.await.unwrap();
}

/// Without a token no request leaves the device.
#[tokio::test]
async fn test_missing_token_fails_without_request() {
    let client = StatusClient::new(200);
    let narration =
        HttpNarrationService::new(Arc::clone(&client), Arc::new(SessionCredentials::new(None)));

    let (controller, task, shutdown) =
        spawn_controller(Arc::new(narration), ScriptedAudio { duration: Some(5.0) });

    controller.play(NarrationRequest::new(landmark())).unwrap();
    let session = wait_for(&controller, |s| matches!(s.state, PlaybackState::Failed(_))).await;

    assert_eq!(
        session.state.failure(),
        Some(&PlaybackFailure::Narration(NarrationError::Unauthorized))
    );
    assert!(client.requests().is_empty());

    shutdown.cancel();
    task.await.unwrap();
}

/// A track with no known duration cannot be played.
#[tokio::test]
async fn test_zero_duration_track_fails() {
    let (controller, task, shutdown) = spawn_controller(
        ScriptedNarration::new(Narration::Ready),
        ScriptedAudio {
            duration: Some(0.0),
        },
    );

    controller.play(NarrationRequest::new(landmark())).unwrap();
    let session = wait_for(&controller, |s| matches!(s.state, PlaybackState::Failed(_))).await;
    assert!(matches!(
        session.state.failure(),
        Some(PlaybackFailure::Audio(_))
    ));

    shutdown.cancel();
    task.await.unwrap();
}

// ============================================================================
// Stop From Every State
// ============================================================================

async fn assert_stop_resets(controller: &PlaybackController) {
    controller.stop().unwrap();
    let session = wait_for_state(controller, PlaybackState::Idle).await;
    assert_eq!(session.current_time_seconds, 0.0);
    assert_eq!(session.duration_seconds, 0.0);
    assert_eq!(session.narration, None);
    assert_eq!(session.landmark_id, None);
    assert_eq!(session.playback_rate, 1.5, "rate survives stop");
}

#[tokio::test]
async fn test_stop_while_generating_story() {
    let narration = ScriptedNarration::new(Narration::Held);
    let (controller, task, shutdown) = spawn_controller(
        Arc::clone(&narration) as Arc<dyn NarrationService>,
        ScriptedAudio {
            duration: Some(5.0),
        },
    );
    controller.set_rate(1.5).unwrap();

    controller.play(NarrationRequest::new(landmark())).unwrap();
    wait_for_state(&controller, PlaybackState::GeneratingStory).await;

    assert_stop_resets(&controller).await;
    assert_eq!(narration.calls.load(Ordering::SeqCst), 1);

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_stop_while_preparing_audio() {
    let (controller, task, shutdown) = spawn_controller(
        ScriptedNarration::new(Narration::Ready),
        ScriptedAudio { duration: None },
    );
    controller.set_rate(1.5).unwrap();

    controller.play(NarrationRequest::new(landmark())).unwrap();
    let session = wait_for_state(&controller, PlaybackState::PreparingAudio).await;
    assert_eq!(
        session.narration.map(|n| n.place_name),
        Some("Colosseum".to_string())
    );

    assert_stop_resets(&controller).await;

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_stop_while_playing_and_paused() {
    let (controller, task, shutdown) = spawn_controller(
        ScriptedNarration::new(Narration::Ready),
        ScriptedAudio {
            duration: Some(600.0),
        },
    );
    controller.set_rate(1.5).unwrap();

    controller.play(NarrationRequest::new(landmark())).unwrap();
    let session = wait_for_state(&controller, PlaybackState::Playing).await;
    assert_eq!(session.duration_seconds, 600.0);
    assert_eq!(session.playback_rate, 1.5);
    assert_stop_resets(&controller).await;

    controller.play(NarrationRequest::new(landmark())).unwrap();
    wait_for_state(&controller, PlaybackState::Playing).await;
    controller.toggle().unwrap();
    wait_for_state(&controller, PlaybackState::Paused).await;
    assert_stop_resets(&controller).await;

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_stop_after_failure() {
    let (controller, task, shutdown) = spawn_controller(
        ScriptedNarration::new(Narration::Fails(NarrationError::ServerError)),
        ScriptedAudio {
            duration: Some(5.0),
        },
    );
    controller.set_rate(1.5).unwrap();

    controller.play(NarrationRequest::new(landmark())).unwrap();
    let session = wait_for(&controller, |s| matches!(s.state, PlaybackState::Failed(_))).await;
    assert_eq!(session.status_message(), "Server error. Please try again later.");

    assert_stop_resets(&controller).await;

    shutdown.cancel();
    task.await.unwrap();
}

// ============================================================================
// Seek And Rate
// ============================================================================

#[tokio::test]
async fn test_seek_clamps_to_track() {
    let (controller, task, shutdown) = spawn_controller(
        ScriptedNarration::new(Narration::Ready),
        ScriptedAudio {
            duration: Some(10.0),
        },
    );

    // Nothing to seek yet.
    controller.seek(4.0).unwrap();
    assert_eq!(controller.session().current_time_seconds, 0.0);

    controller.play(NarrationRequest::new(landmark())).unwrap();
    wait_for_state(&controller, PlaybackState::Playing).await;
    controller.pause().unwrap();
    wait_for_state(&controller, PlaybackState::Paused).await;

    controller.seek(25.0).unwrap();
    wait_for(&controller, |s| s.current_time_seconds == 10.0).await;

    controller.seek(-3.0).unwrap();
    wait_for(&controller, |s| s.current_time_seconds == 0.0).await;

    controller.seek(4.0).unwrap();
    let session = wait_for(&controller, |s| s.current_time_seconds == 4.0).await;
    assert_eq!(session.state, PlaybackState::Paused);

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_invalid_rate_is_rejected_synchronously() {
    let (controller, task, shutdown) = spawn_controller(
        ScriptedNarration::new(Narration::Ready),
        ScriptedAudio {
            duration: Some(10.0),
        },
    );

    assert!(controller.set_rate(0.1).is_err());
    assert!(controller.set_rate(8.0).is_err());
    assert_eq!(controller.session().playback_rate, 1.0);

    controller.set_rate(0.75).unwrap();
    wait_for(&controller, |s| s.playback_rate == 0.75).await;

    shutdown.cancel();
    task.await.unwrap();
}
