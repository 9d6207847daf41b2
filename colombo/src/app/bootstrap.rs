//! Application bootstrap implementation.
//!
//! [`TourGuide`] owns the three long-running tasks and the channels between
//! them. They share one cancellation token, so shutdown stops all of them
//! together.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::config::AppConfig;
use super::error::AppError;
use crate::discovery::{DiscoveryHandle, Landmark, LandmarkDiscoveryEngine, LandmarkSnapshot};
use crate::geosearch::{GeosearchClient, WikipediaGeosearch};
use crate::landmark::{LandmarkSource, OverpassLandmarkSource};
use crate::location::{run_tracker, LocationEvent, ProximityTracker, TrackerStats, TrackerStatus};
use crate::narration::{
    CredentialProvider, EnvCredentials, HttpNarrationService, NarrationRequest, NarrationService,
    SessionCredentials,
};
use crate::places::{PlaceDirectory, PlaceRecord, RestPlaceDirectory};
use crate::playback::{AudioBackend, HttpAudioBackend, PlaybackController};
use crate::provider::ReqwestClient;

/// External collaborators of the pipeline.
///
/// [`TourGuide::start`] builds the HTTP-backed set; tests and embedders can
/// supply their own through [`TourGuide::with_services`].
#[derive(Clone)]
pub struct TourServices {
    pub source: Arc<dyn LandmarkSource>,
    pub geosearch: Arc<dyn GeosearchClient>,
    pub narration: Arc<dyn NarrationService>,
    pub audio: Arc<dyn AudioBackend>,
    pub places: Option<Arc<dyn PlaceDirectory>>,
}

impl TourServices {
    /// Builds the HTTP-backed services from `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let http = ReqwestClient::new()?;

        let geosearch = match &config.geosearch.endpoint {
            Some(endpoint) => WikipediaGeosearch::with_endpoint(http.clone(), endpoint.clone()),
            None => WikipediaGeosearch::new(http.clone(), &config.geosearch.language),
        }
        .with_timeout(config.geosearch.timeout);

        let source =
            OverpassLandmarkSource::with_endpoint(http.clone(), config.overpass.endpoint.clone())
                .with_timeout(config.overpass.timeout);

        let credentials: Arc<dyn CredentialProvider> = match &config.narration.access_token {
            Some(token) => Arc::new(SessionCredentials::new(Some(token.clone()))),
            None => Arc::new(EnvCredentials::default()),
        };
        let narration = HttpNarrationService::new(http.clone(), credentials)
            .with_base_url(config.narration.base_url.clone())
            .with_timeout(config.narration.timeout);

        let places = config.places.as_ref().map(|places| {
            Arc::new(RestPlaceDirectory::new(
                http.clone(),
                places.base_url.clone(),
                places.api_key.clone(),
            )) as Arc<dyn PlaceDirectory>
        });

        Ok(Self {
            source: Arc::new(source),
            geosearch: Arc::new(geosearch),
            narration: Arc::new(narration),
            audio: Arc::new(HttpAudioBackend::new(http).with_output(config.audio_output)),
            places,
        })
    }
}

struct Tasks {
    tracker: JoinHandle<TrackerStats>,
    discovery: JoinHandle<()>,
    playback: JoinHandle<()>,
}

/// The running landmark pipeline.
///
/// Location events flow in through [`location_sender`](Self::location_sender),
/// landmark lists come out through [`landmarks`](Self::landmarks), and
/// narration is driven through [`playback`](Self::playback).
///
/// # Example
///
/// ```ignore
/// use colombo::app::{AppConfig, TourGuide};
/// use colombo::location::{LocationEvent, LocationFix};
///
/// let guide = TourGuide::start(AppConfig::default())?;
/// guide
///     .location_sender()
///     .send(LocationEvent::Fix(LocationFix::now(coordinate)))
///     .await?;
///
/// let mut landmarks = guide.landmarks();
/// landmarks.changed().await?;
/// if let Some(first) = landmarks.borrow().landmarks.first() {
///     guide.select_landmark(&first.id, None)?;
/// }
///
/// guide.shutdown().await;
/// ```
pub struct TourGuide {
    location_tx: mpsc::Sender<LocationEvent>,
    tracker_status: watch::Receiver<TrackerStatus>,
    discovery: DiscoveryHandle,
    playback: PlaybackController,
    places: Option<Arc<dyn PlaceDirectory>>,
    default_language: Option<String>,
    shutdown: CancellationToken,
    tasks: Mutex<Option<Tasks>>,
}

impl TourGuide {
    /// Starts the pipeline with HTTP-backed services.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: AppConfig) -> Result<Self, AppError> {
        let services = TourServices::from_config(&config)?;
        Ok(Self::with_services(services, config))
    }

    /// Starts the pipeline with the given services.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_services(services: TourServices, config: AppConfig) -> Self {
        info!(
            source = services.source.name(),
            search_radius_m = config.discovery.search_radius_meters,
            "Starting tour guide"
        );

        let shutdown = CancellationToken::new();

        let engine = LandmarkDiscoveryEngine::new(
            services.source,
            services.geosearch,
            config.discovery.clone(),
        );
        let (discovery, discovery_task) = engine.spawn(shutdown.child_token());

        let (playback, playback_task) = PlaybackController::spawn(
            services.narration,
            services.audio,
            config.playback.clone(),
            shutdown.child_token(),
        );

        let (location_tx, location_rx) = mpsc::channel(config.location_channel_capacity.max(1));
        let (status_tx, tracker_status) = watch::channel(TrackerStatus::Waiting);
        let tracker_task = tokio::spawn(run_tracker(
            ProximityTracker::new(config.tracker.clone()),
            location_rx,
            discovery.clone(),
            status_tx,
            shutdown.child_token(),
        ));

        Self {
            location_tx,
            tracker_status,
            discovery,
            playback,
            places: services.places,
            default_language: config.narration.language,
            shutdown,
            tasks: Mutex::new(Some(Tasks {
                tracker: tracker_task,
                discovery: discovery_task,
                playback: playback_task,
            })),
        }
    }

    /// Sender for raw location events (fixes, errors, authorization changes).
    pub fn location_sender(&self) -> mpsc::Sender<LocationEvent> {
        self.location_tx.clone()
    }

    /// Subscribes to tracker status changes.
    pub fn tracker_status(&self) -> watch::Receiver<TrackerStatus> {
        self.tracker_status.clone()
    }

    /// Subscribes to landmark list updates.
    pub fn landmarks(&self) -> watch::Receiver<LandmarkSnapshot> {
        self.discovery.subscribe()
    }

    pub fn snapshot(&self) -> LandmarkSnapshot {
        self.discovery.snapshot()
    }

    /// Clears the list and re-runs discovery at the latest position.
    /// Returns false if no position has been seen yet.
    pub fn refresh(&self) -> bool {
        self.discovery.refresh()
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    /// Starts narration for a landmark in the current list.
    ///
    /// `language` overrides the configured default hint.
    pub fn select_landmark(&self, id: &str, language: Option<&str>) -> Result<Landmark, AppError> {
        if self.is_shut_down() {
            return Err(AppError::ShutDown);
        }

        let landmark = self
            .discovery
            .find(id)
            .ok_or_else(|| AppError::UnknownLandmark(id.to_string()))?;

        let mut request = NarrationRequest::new(landmark.clone());
        if let Some(language) = language.or(self.default_language.as_deref()) {
            request = request.with_language(language);
        }

        info!(landmark_id = %landmark.id, name = %landmark.name(), "Landmark selected");
        self.playback.play(request)?;
        Ok(landmark)
    }

    /// Looks up the stored record for a landmark. `None` when no directory
    /// is configured or nothing is stored.
    pub async fn place_record(&self, landmark: &Landmark) -> Result<Option<PlaceRecord>, AppError> {
        let Some(places) = &self.places else {
            return Ok(None);
        };
        Ok(places.find_by_external_id(&landmark.id).await?)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stops every task and waits for them to exit. Safe to call repeatedly.
    pub async fn shutdown(&self) -> Option<TrackerStats> {
        self.shutdown.cancel();

        let tasks = self.tasks.lock().take()?;
        info!("Shutting down tour guide");

        let stats = tasks.tracker.await.ok();
        let _ = tasks.discovery.await;
        let _ = tasks.playback.await;

        info!("Tour guide shutdown complete");
        stats
    }
}

impl Drop for TourGuide {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
