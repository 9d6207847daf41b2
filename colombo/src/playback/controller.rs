//! Playback controller actor.
//!
//! One task owns the [`PlaybackSession`] and the open audio track. Callers
//! hold a cloneable [`PlaybackController`] handle that sends commands and
//! reads snapshots; they never mutate the session directly.
//!
//! # State Machine
//!
//! ```text
//!          play            narration ok          audio ready
//!   Idle --------> GeneratingStory --------> PreparingAudio --------> Playing <--> Paused
//!    ^                   |                        |                    |
//!    |                   | narration error        | audio error        | end of track
//!    |                   v                        v                    v
//!    +----ack------- Failed(reason) <-------------+                 Finished --auto--> Idle
//!
//!   any state --stop--> Idle (position 0, job cancelled, track released)
//! ```
//!
//! The narration request and audio download run on a separate job task
//! tagged with a generation number. Results from a superseded generation
//! are dropped, which also releases any track they carry.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::audio::{AudioBackend, AudioError, AudioTrack};
use super::state::{
    is_valid_rate, PlaybackEvent, PlaybackFailure, PlaybackSession, PlaybackState,
    MAX_PLAYBACK_RATE, MIN_PLAYBACK_RATE,
};
use crate::narration::{NarrationError, NarrationRequest, NarrationResult, NarrationService};

/// Default interval between position samples while playing.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Default playback rate.
pub const DEFAULT_PLAYBACK_RATE: f64 = 1.0;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Configuration for [`PlaybackController`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    pub sample_interval: Duration,
    /// Rate applied to new sessions until changed.
    pub default_rate: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            default_rate: DEFAULT_PLAYBACK_RATE,
        }
    }
}

impl PlaybackConfig {
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    pub fn with_default_rate(mut self, rate: f64) -> Self {
        self.default_rate = rate;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    #[error("Playback rate {0} outside [{min}, {max}]", min = MIN_PLAYBACK_RATE, max = MAX_PLAYBACK_RATE)]
    InvalidRate(f64),

    #[error("Playback controller has shut down")]
    ControllerClosed,
}

#[derive(Debug)]
enum Command {
    Play(Box<NarrationRequest>),
    Pause,
    Resume,
    Toggle,
    Seek(f64),
    SetRate(f64),
    Stop,
    Acknowledge,
}

enum JobUpdate {
    Narration(Result<NarrationResult, NarrationError>),
    Audio(Result<Box<dyn AudioTrack>, AudioError>),
}

struct ActiveJob {
    generation: u64,
    cancel: CancellationToken,
}

/// Handle to a running playback actor.
#[derive(Clone)]
pub struct PlaybackController {
    commands: mpsc::UnboundedSender<Command>,
    session: watch::Receiver<PlaybackSession>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackController {
    /// Starts the actor. It runs until `shutdown` is cancelled or every
    /// handle is dropped, and releases its audio track on exit.
    pub fn spawn(
        narration: Arc<dyn NarrationService>,
        audio: Arc<dyn AudioBackend>,
        config: PlaybackConfig,
        shutdown: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let rate = if is_valid_rate(config.default_rate) {
            config.default_rate
        } else {
            tracing::warn!(rate = config.default_rate, "Invalid default rate, using 1.0");
            DEFAULT_PLAYBACK_RATE
        };

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (session_tx, session_rx) = watch::channel(PlaybackSession::with_rate(rate));
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (job_tx, job_rx) = mpsc::unbounded_channel();

        let actor = Actor {
            narration,
            audio,
            sample_interval: config.sample_interval,
            session_tx,
            events: event_tx.clone(),
            track: None,
            job: None,
            generation: 0,
            job_tx,
            shutdown: shutdown.clone(),
        };

        let task = tokio::spawn(actor.run(command_rx, job_rx, shutdown));

        (
            Self {
                commands: command_tx,
                session: session_rx,
                events: event_tx,
            },
            task,
        )
    }

    fn send(&self, command: Command) -> Result<(), PlaybackError> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::ControllerClosed)
    }

    /// Starts narration for a landmark, stopping any current session first.
    pub fn play(&self, request: NarrationRequest) -> Result<(), PlaybackError> {
        self.send(Command::Play(Box::new(request)))
    }

    pub fn pause(&self) -> Result<(), PlaybackError> {
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> Result<(), PlaybackError> {
        self.send(Command::Resume)
    }

    /// Switches between playing and paused.
    pub fn toggle(&self) -> Result<(), PlaybackError> {
        self.send(Command::Toggle)
    }

    /// Moves the playhead, clamped to the track. Ignored without a track.
    pub fn seek(&self, seconds: f64) -> Result<(), PlaybackError> {
        self.send(Command::Seek(seconds))
    }

    pub fn set_rate(&self, rate: f64) -> Result<(), PlaybackError> {
        if !is_valid_rate(rate) {
            return Err(PlaybackError::InvalidRate(rate));
        }
        self.send(Command::SetRate(rate))
    }

    /// Returns to `Idle` from any state, cancelling in-flight requests.
    pub fn stop(&self) -> Result<(), PlaybackError> {
        self.send(Command::Stop)
    }

    /// Clears a `Failed` state back to `Idle`.
    pub fn acknowledge(&self) -> Result<(), PlaybackError> {
        self.send(Command::Acknowledge)
    }

    pub fn session(&self) -> PlaybackSession {
        self.session.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSession> {
        self.session.clone()
    }

    pub fn events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }
}

struct Actor {
    narration: Arc<dyn NarrationService>,
    audio: Arc<dyn AudioBackend>,
    sample_interval: Duration,
    session_tx: watch::Sender<PlaybackSession>,
    events: broadcast::Sender<PlaybackEvent>,
    track: Option<Box<dyn AudioTrack>>,
    job: Option<ActiveJob>,
    generation: u64,
    job_tx: mpsc::UnboundedSender<(u64, JobUpdate)>,
    shutdown: CancellationToken,
}

impl Actor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut jobs: mpsc::UnboundedReceiver<(u64, JobUpdate)>,
        shutdown: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(self.sample_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::debug!("Playback controller started");

        loop {
            let playing = self.state() == PlaybackState::Playing;

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                command = commands.recv() => {
                    let Some(command) = command else { break };
                    self.handle_command(command);
                }

                Some((generation, update)) = jobs.recv() => {
                    self.handle_job(generation, update);
                }

                _ = ticker.tick(), if playing => self.sample(),
            }
        }

        self.reset_to_idle();
        tracing::debug!("Playback controller stopped");
    }

    fn state(&self) -> PlaybackState {
        self.session_tx.borrow().state.clone()
    }

    fn transition(&mut self, to: PlaybackState) {
        let from = self.state();
        if from == to {
            return;
        }
        self.session_tx.send_modify(|s| s.state = to.clone());
        tracing::debug!(from = %from, to = %to, "Playback state changed");
        let _ = self.events.send(PlaybackEvent::StateChanged { from, to });
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Play(request) => self.start(*request),
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::Toggle => match self.state() {
                PlaybackState::Playing => self.pause(),
                PlaybackState::Paused => self.resume(),
                _ => {}
            },
            Command::Seek(seconds) => self.seek(seconds),
            Command::SetRate(rate) => {
                if let Some(track) = self.track.as_mut() {
                    track.set_rate(rate);
                }
                self.session_tx.send_modify(|s| s.playback_rate = rate);
            }
            Command::Stop => {
                self.reset_to_idle();
            }
            Command::Acknowledge => {
                if matches!(self.state(), PlaybackState::Failed(_)) {
                    self.reset_to_idle();
                }
            }
        }
    }

    fn start(&mut self, request: NarrationRequest) {
        if self.state() != PlaybackState::Idle {
            tracing::debug!("New narration supersedes current session");
            self.reset_to_idle();
        }

        let landmark_id = request.landmark.id.clone();
        self.session_tx
            .send_modify(|s| s.landmark_id = Some(landmark_id.clone()));
        self.transition(PlaybackState::GeneratingStory);

        self.generation += 1;
        let generation = self.generation;
        let cancel = self.shutdown.child_token();

        let narration = Arc::clone(&self.narration);
        let audio = Arc::clone(&self.audio);
        let job_tx = self.job_tx.clone();
        let token = cancel.clone();

        tokio::spawn(async move {
            let narrated = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                result = narration.request_narration(&request) => result,
            };

            let audio_uri = narrated.as_ref().ok().map(|r| r.audio_uri.clone());
            if job_tx
                .send((generation, JobUpdate::Narration(narrated)))
                .is_err()
            {
                return;
            }
            let Some(uri) = audio_uri else { return };

            let opened = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                result = audio.open(&uri) => result,
            };
            let _ = job_tx.send((generation, JobUpdate::Audio(opened)));
        });

        tracing::info!(landmark = %landmark_id, generation, "Narration requested");
        self.job = Some(ActiveJob { generation, cancel });
    }

    fn handle_job(&mut self, generation: u64, update: JobUpdate) {
        let current = self.job.as_ref().map(|j| j.generation);
        if current != Some(generation) {
            tracing::trace!(generation, "Dropping stale job update");
            return;
        }

        match update {
            JobUpdate::Narration(Ok(result)) => {
                if self.state() != PlaybackState::GeneratingStory {
                    return;
                }
                self.session_tx
                    .send_modify(|s| s.narration = Some(result.clone()));
                let _ = self.events.send(PlaybackEvent::NarrationReady(result));
                self.transition(PlaybackState::PreparingAudio);
            }
            JobUpdate::Narration(Err(err)) => {
                tracing::warn!(error = %err, "Narration failed");
                self.job = None;
                self.transition(PlaybackState::Failed(err.into()));
            }
            JobUpdate::Audio(Ok(track)) => {
                self.job = None;
                if self.state() != PlaybackState::PreparingAudio {
                    return;
                }
                self.begin_playback(track);
            }
            JobUpdate::Audio(Err(err)) => {
                tracing::warn!(error = %err, "Audio preparation failed");
                self.job = None;
                self.transition(PlaybackState::Failed(err.into()));
            }
        }
    }

    fn begin_playback(&mut self, mut track: Box<dyn AudioTrack>) {
        let duration = match track.duration() {
            Some(d) if d.is_finite() && d > 0.0 => d,
            _ => {
                let failure =
                    PlaybackFailure::Audio(AudioError::LoadFailure("unknown duration".to_string()));
                self.transition(PlaybackState::Failed(failure));
                return;
            }
        };

        let rate = self.session_tx.borrow().playback_rate;
        track.set_rate(rate);
        track.play();
        self.track = Some(track);

        self.session_tx.send_modify(|s| {
            s.duration_seconds = duration;
            s.current_time_seconds = 0.0;
        });
        tracing::info!(duration_s = duration, rate, "Playback started");
        self.transition(PlaybackState::Playing);
    }

    fn pause(&mut self) {
        if self.state() != PlaybackState::Playing {
            return;
        }
        if let Some(track) = self.track.as_mut() {
            track.pause();
        }
        self.publish_position();
        self.transition(PlaybackState::Paused);
    }

    fn resume(&mut self) {
        if self.state() != PlaybackState::Paused {
            return;
        }
        if let Some(track) = self.track.as_mut() {
            track.play();
        }
        self.transition(PlaybackState::Playing);
    }

    fn seek(&mut self, seconds: f64) {
        let (has_audio, duration) = {
            let session = self.session_tx.borrow();
            (session.state.has_audio(), session.duration_seconds)
        };
        if !has_audio || seconds.is_nan() {
            tracing::debug!(seconds, "Seek ignored without an open track");
            return;
        }
        let Some(track) = self.track.as_mut() else {
            return;
        };

        let target = seconds.clamp(0.0, duration);
        track.seek(target);
        self.session_tx
            .send_modify(|s| s.current_time_seconds = target);
    }

    fn publish_position(&mut self) {
        let Some(track) = self.track.as_ref() else {
            return;
        };
        let position = track.position();
        self.session_tx.send_if_modified(|s| {
            let clamped = position.clamp(0.0, s.duration_seconds);
            let changed = s.current_time_seconds != clamped;
            s.current_time_seconds = clamped;
            changed
        });
    }

    fn sample(&mut self) {
        self.publish_position();

        if self.track.as_ref().is_some_and(|t| t.is_finished()) {
            self.finish();
        }
    }

    fn finish(&mut self) {
        let landmark_id = self.session_tx.borrow().landmark_id.clone();
        tracing::info!(landmark = ?landmark_id, "Playback finished");

        self.transition(PlaybackState::Finished);
        let _ = self.events.send(PlaybackEvent::Finished { landmark_id });
        self.reset_to_idle();
    }

    /// Cancels the job, releases the track and resets the session,
    /// keeping the selected rate.
    fn reset_to_idle(&mut self) {
        if let Some(job) = self.job.take() {
            job.cancel.cancel();
        }
        self.track = None;

        let from = self.state();
        self.session_tx
            .send_modify(|s| *s = PlaybackSession::with_rate(s.playback_rate));

        if from != PlaybackState::Idle {
            tracing::debug!(from = %from, "Playback reset to idle");
            let _ = self.events.send(PlaybackEvent::StateChanged {
                from,
                to: PlaybackState::Idle,
            });
        }
    }
}
