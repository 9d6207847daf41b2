//! Narration playback
//!
//! [`PlaybackController`] drives a single linear pipeline per landmark
//! selection: request the story, fetch its audio, then play it on the
//! output device with pause, seek and rate control. Snapshots are published
//! through a `watch` channel and transitions through a `broadcast` channel.
//!
//! # Example
//!
//! ```ignore
//! use colombo::playback::{HttpAudioBackend, PlaybackConfig, PlaybackController};
//!
//! let (playback, _task) = PlaybackController::spawn(
//!     narration,
//!     Arc::new(HttpAudioBackend::new(ReqwestClient::new()?)),
//!     PlaybackConfig::default(),
//!     shutdown.child_token(),
//! );
//!
//! playback.play(NarrationRequest::new(landmark))?;
//! let mut session = playback.subscribe();
//! while session.changed().await.is_ok() {
//!     println!("{}", session.borrow().status_message());
//! }
//! ```

mod audio;
mod controller;
mod output;
mod state;
mod stream;

pub use audio::{AudioBackend, AudioError, AudioTrack, ClockTrack};
pub use controller::{
    PlaybackConfig, PlaybackController, PlaybackError, DEFAULT_PLAYBACK_RATE,
    DEFAULT_SAMPLE_INTERVAL,
};
pub use state::{
    format_time, is_valid_rate, rate_label, PlaybackEvent, PlaybackFailure, PlaybackSession,
    PlaybackState, MAX_PLAYBACK_RATE, MIN_PLAYBACK_RATE, RATE_PRESETS,
};
pub use output::{AudioOutput, DecodedAudio, DeviceTrack};
pub use stream::{audio_duration, decode_audio, HttpAudioBackend, DEFAULT_AUDIO_TIMEOUT};

#[cfg(test)]
pub(crate) use controller::tests::{FakeAudio, FakeNarration};
