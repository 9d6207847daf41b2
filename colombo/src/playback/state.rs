//! Playback session state.

use std::fmt;

use thiserror::Error;

use super::audio::AudioError;
use crate::narration::{NarrationError, NarrationResult};

/// Slowest accepted playback rate.
pub const MIN_PLAYBACK_RATE: f64 = 0.25;

/// Fastest accepted playback rate.
pub const MAX_PLAYBACK_RATE: f64 = 4.0;

/// Rates offered by the speed selector.
pub const RATE_PRESETS: [f64; 4] = [0.75, 1.0, 1.25, 1.5];

/// Reason a session entered [`PlaybackState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackFailure {
    #[error("{0}")]
    Narration(#[from] NarrationError),

    #[error("{0}")]
    Audio(#[from] AudioError),
}

/// Playback pipeline state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    GeneratingStory,
    PreparingAudio,
    Playing,
    Paused,
    Finished,
    /// Terminal until acknowledged.
    Failed(PlaybackFailure),
}

impl PlaybackState {
    /// Returns true while a narration or audio request is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            PlaybackState::GeneratingStory | PlaybackState::PreparingAudio
        )
    }

    /// Returns true if an audio resource is open.
    pub fn has_audio(&self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }

    pub fn failure(&self) -> Option<&PlaybackFailure> {
        match self {
            PlaybackState::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::GeneratingStory => write!(f, "generating story"),
            PlaybackState::PreparingAudio => write!(f, "preparing audio"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Finished => write!(f, "finished"),
            PlaybackState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Snapshot of the controller's single session.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub state: PlaybackState,
    /// In `[0, duration_seconds]` once the duration is known, else 0.
    pub current_time_seconds: f64,
    /// 0 while unknown.
    pub duration_seconds: f64,
    pub playback_rate: f64,
    /// Landmark this session belongs to.
    pub landmark_id: Option<String>,
    pub narration: Option<NarrationResult>,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::with_rate(1.0)
    }
}

impl PlaybackSession {
    pub fn with_rate(playback_rate: f64) -> Self {
        Self {
            state: PlaybackState::Idle,
            current_time_seconds: 0.0,
            duration_seconds: 0.0,
            playback_rate,
            landmark_id: None,
            narration: None,
        }
    }

    pub fn duration_known(&self) -> bool {
        self.duration_seconds > 0.0
    }

    /// Fraction of the track played, in [0, 1].
    pub fn progress(&self) -> f64 {
        if self.duration_known() {
            (self.current_time_seconds / self.duration_seconds).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// `"m:ss"` label of the current position.
    pub fn position_label(&self) -> String {
        format_time(self.current_time_seconds)
    }

    /// `"m:ss"` label of the duration.
    pub fn duration_label(&self) -> String {
        format_time(self.duration_seconds)
    }

    /// Display string for the UI, e.g. `"Preparing audio..."`.
    pub fn status_message(&self) -> String {
        match &self.state {
            PlaybackState::Idle => String::new(),
            PlaybackState::GeneratingStory => "Generating story...".to_string(),
            PlaybackState::PreparingAudio => "Preparing audio...".to_string(),
            PlaybackState::Playing | PlaybackState::Paused => {
                format!("{} / {}", self.position_label(), self.duration_label())
            }
            PlaybackState::Finished => "Finished".to_string(),
            PlaybackState::Failed(reason) => reason.to_string(),
        }
    }
}

/// Formats seconds as `m:ss`. Negative and non-finite input render as `0:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Label for a rate preset, e.g. `"1.25x"`.
pub fn rate_label(rate: f64) -> String {
    let formatted = format!("{:.2}", rate);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{}x", trimmed)
}

/// Returns true if `rate` is finite and within the accepted range.
pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && (MIN_PLAYBACK_RATE..=MAX_PLAYBACK_RATE).contains(&rate)
}

/// Events broadcast by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    StateChanged {
        from: PlaybackState,
        to: PlaybackState,
    },
    /// The narration text arrived; audio is being prepared.
    NarrationReady(NarrationResult),
    /// The track played to its end.
    Finished { landmark_id: Option<String> },
}
