//! Audio resource abstraction.
//!
//! An [`AudioBackend`] opens a narration's `audio_uri` into an
//! [`AudioTrack`]. The controller owns at most one track at a time and
//! releases it by dropping it.

use thiserror::Error;
use tokio::time::Instant;

use crate::provider::BoxFuture;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// The audio URI is malformed or uses an unsupported scheme.
    #[error("Invalid audio source: {0}")]
    InvalidSource(String),

    /// The audio could not be fetched or its duration determined.
    #[error("Failed to load audio: {0}")]
    LoadFailure(String),

    /// No output device could be opened.
    #[error("Audio output unavailable: {0}")]
    Output(String),
}

/// An opened audio resource with a playhead.
///
/// Implementations must keep `position()` within `[0, duration]`.
pub trait AudioTrack: Send {
    /// Total length in seconds, if known.
    fn duration(&self) -> Option<f64>;

    /// Current playhead in seconds.
    fn position(&self) -> f64;

    fn play(&mut self);

    fn pause(&mut self);

    fn is_playing(&self) -> bool;

    /// Moves the playhead. Callers clamp before calling.
    fn seek(&mut self, seconds: f64);

    fn set_rate(&mut self, rate: f64);

    /// Returns true once the playhead has reached the end.
    fn is_finished(&self) -> bool {
        self.duration()
            .map(|duration| self.position() >= duration)
            .unwrap_or(false)
    }
}

/// Opens audio resources.
pub trait AudioBackend: Send + Sync {
    fn open<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, Result<Box<dyn AudioTrack>, AudioError>>;
}

impl<T: AudioBackend + ?Sized> AudioBackend for std::sync::Arc<T> {
    fn open<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, Result<Box<dyn AudioTrack>, AudioError>> {
        (**self).open(uri)
    }
}

/// Software playhead advancing with the tokio clock.
///
/// Position is derived from the time elapsed since the last play, scaled by
/// the rate, so it can be sampled at any interval without drift. Holding the
/// decoded payload (if any) ties the resource's lifetime to the track.
#[derive(Debug)]
pub struct ClockTrack<P = ()> {
    duration: f64,
    offset: f64,
    rate: f64,
    started_at: Option<Instant>,
    _payload: P,
}

impl ClockTrack<()> {
    pub fn new(duration: f64) -> Self {
        Self::with_payload(duration, ())
    }
}

impl<P> ClockTrack<P> {
    pub fn with_payload(duration: f64, payload: P) -> Self {
        Self {
            duration: duration.max(0.0),
            offset: 0.0,
            rate: 1.0,
            started_at: None,
            _payload: payload,
        }
    }

    fn elapsed_scaled(&self) -> f64 {
        self.started_at
            .map(|start| start.elapsed().as_secs_f64() * self.rate)
            .unwrap_or(0.0)
    }

    fn playhead(&self) -> f64 {
        (self.offset + self.elapsed_scaled()).clamp(0.0, self.duration)
    }

    fn rebase(&mut self) {
        self.offset = self.playhead();
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }
}

impl<P: Send> AudioTrack for ClockTrack<P> {
    fn duration(&self) -> Option<f64> {
        Some(self.duration)
    }

    fn position(&self) -> f64 {
        self.playhead()
    }

    fn play(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.offset = self.playhead();
        self.started_at = None;
    }

    fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }

    fn seek(&mut self, seconds: f64) {
        self.offset = seconds.clamp(0.0, self.duration);
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }

    fn set_rate(&mut self, rate: f64) {
        self.rebase();
        self.rate = rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_clock_track_advances_while_playing() {
        let mut track = ClockTrack::new(10.0);
        assert_eq!(track.position(), 0.0);

        track.play();
        tokio::time::advance(Duration::from_secs(3)).await;
        assert!((track.position() - 3.0).abs() < 1e-6);

        track.pause();
        tokio::time::advance(Duration::from_secs(3)).await;
        assert!((track.position() - 3.0).abs() < 1e-6);
        assert!(!track.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_track_rate_and_seek() {
        let mut track = ClockTrack::new(60.0);
        track.play();
        tokio::time::advance(Duration::from_secs(2)).await;

        track.set_rate(1.5);
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!((track.position() - 5.0).abs() < 1e-6);

        track.seek(30.0);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!((track.position() - 31.5).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_track_stops_at_duration() {
        let mut track = ClockTrack::new(2.0);
        track.play();
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(track.position(), 2.0);
        assert!(track.is_finished());
    }

    /// Rate changes on a track that owns its downloaded bytes keep the
    /// playhead continuous.
    #[tokio::test(start_paused = true)]
    async fn test_clock_track_with_payload_rate_change() {
        let mut track = ClockTrack::with_payload(60.0, bytes::Bytes::from_static(b"ID3"));
        track.play();
        tokio::time::advance(Duration::from_secs(4)).await;

        track.set_rate(0.5);
        assert!((track.position() - 4.0).abs() < 1e-6);

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!((track.position() - 6.0).abs() < 1e-6);

        track.pause();
        track.set_rate(2.0);
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!((track.position() - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_audio_error_display() {
        assert_eq!(
            AudioError::InvalidSource("ftp://x".into()).to_string(),
            "Invalid audio source: ftp://x"
        );
    }
}
