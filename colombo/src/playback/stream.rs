//! HTTP audio backend.
//!
//! Downloads the narration audio in full, decodes it and hands back a
//! [`DeviceTrack`] playing on the default output device. With
//! [`AudioOutput::Silent`], or when no device can be opened, the container
//! is only read for its duration and a [`ClockTrack`] stands in.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::audio::{AudioBackend, AudioError, AudioTrack, ClockTrack};
use super::output::{AudioOutput, DecodedAudio, DeviceTrack};
use crate::provider::{BoxFuture, HttpClient, HttpRequest};

/// Default timeout for downloading an audio file.
pub const DEFAULT_AUDIO_TIMEOUT: Duration = Duration::from_secs(60);

/// Backend that fetches audio over HTTP(S).
pub struct HttpAudioBackend<C: HttpClient> {
    http_client: C,
    timeout: Duration,
    output: AudioOutput,
}

impl<C: HttpClient> HttpAudioBackend<C> {
    pub fn new(http_client: C) -> Self {
        Self {
            http_client,
            timeout: DEFAULT_AUDIO_TIMEOUT,
            output: AudioOutput::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_output(mut self, output: AudioOutput) -> Self {
        self.output = output;
        self
    }
}

/// Validates an audio URI and returns the file extension hint, if any.
fn parse_source(uri: &str) -> Result<Option<String>, AudioError> {
    let url = reqwest::Url::parse(uri)
        .map_err(|e| AudioError::InvalidSource(format!("{}: {}", uri, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AudioError::InvalidSource(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }

    let extension = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|file| file.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    Ok(extension)
}

/// Reads the duration in seconds from an in-memory audio file.
///
/// Uses the container's frame count when present; otherwise sums packet
/// durations, which covers MP3 files without a Xing/Info header.
pub fn audio_duration(data: Bytes, extension: Option<&str>) -> Result<f64, AudioError> {
    let mut format = open_format(data, extension)?;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::LoadFailure("no audio track found".to_string()))?;

    let track_id = track.id;
    let time_base = track.codec_params.time_base;
    let sample_rate = track.codec_params.sample_rate;

    let frames = match track.codec_params.n_frames {
        Some(frames) => frames,
        None => {
            let mut total = 0u64;
            loop {
                match format.next_packet() {
                    Ok(packet) if packet.track_id() == track_id => total += packet.dur,
                    Ok(_) => {}
                    Err(SymphoniaError::IoError(ref e))
                        if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                    {
                        break
                    }
                    Err(e) => {
                        return Err(AudioError::LoadFailure(format!(
                            "failed to read packets: {}",
                            e
                        )))
                    }
                }
            }
            total
        }
    };

    let seconds = match (time_base, sample_rate) {
        (Some(tb), _) => {
            let time = tb.calc_time(frames);
            time.seconds as f64 + time.frac
        }
        (None, Some(rate)) if rate > 0 => frames as f64 / rate as f64,
        _ => return Err(AudioError::LoadFailure("unknown time base".to_string())),
    };

    if seconds > 0.0 && seconds.is_finite() {
        Ok(seconds)
    } else {
        Err(AudioError::LoadFailure("audio has no duration".to_string()))
    }
}

/// Opens the container format of an in-memory audio file.
fn open_format(data: Bytes, extension: Option<&str>) -> Result<Box<dyn FormatReader>, AudioError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let detected = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::LoadFailure(format!("unsupported audio format: {}", e)))?;

    Ok(detected.format)
}

/// Decodes an in-memory audio file into interleaved `f32` samples.
///
/// Packets that fail to decode are skipped with a warning; any other
/// decoder error aborts.
pub fn decode_audio(data: Bytes, extension: Option<&str>) -> Result<DecodedAudio, AudioError> {
    let mut format = open_format(data, extension)?;

    let (track_id, codec_params) = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .map(|t| (t.id, t.codec_params.clone()))
        .ok_or_else(|| AudioError::LoadFailure("no audio track found".to_string()))?;

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| AudioError::LoadFailure("unknown sample rate".to_string()))?;
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::LoadFailure(format!("unsupported codec: {}", e)))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => {
                return Err(AudioError::LoadFailure(format!(
                    "failed to read packets: {}",
                    e
                )))
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channels = spec.channels.count();
                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
            Err(SymphoniaError::DecodeError(reason)) => {
                tracing::warn!(reason, "Skipping undecodable audio packet");
            }
            Err(e) => return Err(AudioError::LoadFailure(format!("failed to decode: {}", e))),
        }
    }

    DecodedAudio::new(samples, channels, sample_rate)
}

/// Decodes `data` and opens it on the output device, falling back to a
/// silent clock when the device cannot be opened.
fn open_device_track(
    data: Bytes,
    extension: Option<&str>,
) -> Result<Box<dyn AudioTrack>, AudioError> {
    let audio = Arc::new(decode_audio(data, extension)?);
    let duration = audio.duration();

    match DeviceTrack::open(Arc::clone(&audio)) {
        Ok(track) => Ok(Box::new(track)),
        Err(e) => {
            tracing::warn!(error = %e, "Playing without sound");
            Ok(Box::new(ClockTrack::with_payload(duration, audio)))
        }
    }
}

impl<C: HttpClient> AudioBackend for HttpAudioBackend<C> {
    fn open<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, Result<Box<dyn AudioTrack>, AudioError>> {
        Box::pin(async move {
            let extension = parse_source(uri)?;

            let response = self
                .http_client
                .send(HttpRequest::get(uri).with_timeout(self.timeout))
                .await
                .map_err(|e| AudioError::LoadFailure(e.to_string()))?;

            if !response.is_success() {
                return Err(AudioError::LoadFailure(format!(
                    "HTTP {} fetching audio",
                    response.status
                )));
            }

            let data = response.body;
            let size = data.len();
            let output = self.output;
            let track = tokio::task::spawn_blocking(move || match output {
                AudioOutput::Device => open_device_track(data, extension.as_deref()),
                AudioOutput::Silent => {
                    let duration = audio_duration(data.clone(), extension.as_deref())?;
                    Ok(Box::new(ClockTrack::with_payload(duration, data)) as Box<dyn AudioTrack>)
                }
            })
            .await
            .map_err(|e| AudioError::LoadFailure(format!("audio task failed: {}", e)))??;

            tracing::debug!(
                uri,
                bytes = size,
                duration_s = track.duration().unwrap_or_default(),
                %output,
                "Audio prepared"
            );
            Ok(track)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockHttpClient, TransportError};

    /// Minimal PCM WAV: 8 kHz, mono, 16-bit, `samples` frames of silence.
    fn wav(samples: u32) -> Vec<u8> {
        let data_len = samples * 2;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&8000u32.to_le_bytes());
        out.extend_from_slice(&16000u32.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.resize(out.len() + data_len as usize, 0);
        out
    }

    #[test]
    fn test_parse_source() {
        assert_eq!(
            parse_source("https://cdn.example.com/a/story.MP3").unwrap(),
            Some("mp3".to_string())
        );
        assert_eq!(parse_source("https://cdn.example.com/stream").unwrap(), None);
        assert!(matches!(
            parse_source("file:///tmp/a.mp3"),
            Err(AudioError::InvalidSource(_))
        ));
        assert!(matches!(
            parse_source("not a url"),
            Err(AudioError::InvalidSource(_))
        ));
    }

    #[test]
    fn test_wav_duration() {
        let duration = audio_duration(Bytes::from(wav(16_000)), Some("wav")).unwrap();
        assert!((duration - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_duration_of_garbage_fails() {
        let result = audio_duration(Bytes::from_static(b"definitely not audio"), None);
        assert!(matches!(result, Err(AudioError::LoadFailure(_))));
    }

    #[test]
    fn test_decode_wav_samples() {
        let audio = decode_audio(Bytes::from(wav(12_000)), Some("wav")).unwrap();
        assert_eq!(audio.channels(), 1);
        assert_eq!(audio.sample_rate(), 8000);
        assert_eq!(audio.frames(), 12_000);
        assert!((audio.duration() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = decode_audio(Bytes::from_static(b"definitely not audio"), Some("mp3"));
        assert!(matches!(result, Err(AudioError::LoadFailure(_))));
    }

    #[tokio::test]
    async fn test_open_silent_downloads_and_reads_duration() {
        let body = wav(8_000);
        let mock = MockHttpClient::new().with_response(Ok(crate::provider::HttpResponse::new(
            200,
            Bytes::from(body),
        )));
        let backend = HttpAudioBackend::new(mock).with_output(AudioOutput::Silent);

        let track = backend.open("https://cdn.example.com/story.wav").await.unwrap();
        assert!((track.duration().unwrap() - 1.0).abs() < 1e-6);
        assert!(!track.is_playing());
    }

    /// Holds with or without an output device: a missing device falls back
    /// to the clock playhead over the decoded samples.
    #[test]
    fn test_device_track_has_decoded_duration() {
        let track = open_device_track(Bytes::from(wav(4_000)), Some("wav")).unwrap();
        assert!((track.duration().unwrap() - 0.5).abs() < 1e-9);
        assert!(!track.is_playing());
        assert_eq!(track.position(), 0.0);
    }

    #[tokio::test]
    async fn test_open_http_error() {
        let backend = HttpAudioBackend::new(MockHttpClient::ok(404, ""));
        let result = backend.open("https://cdn.example.com/missing.mp3").await;
        assert!(matches!(result, Err(AudioError::LoadFailure(_))));
    }

    #[tokio::test]
    async fn test_open_transport_error() {
        let backend = HttpAudioBackend::new(MockHttpClient::failing(TransportError::Timeout));
        let result = backend.open("https://cdn.example.com/story.mp3").await;
        assert!(matches!(result, Err(AudioError::LoadFailure(_))));
    }

    #[tokio::test]
    async fn test_open_invalid_source_makes_no_request() {
        let backend = HttpAudioBackend::new(MockHttpClient::new());
        let result = backend.open("").await;
        assert!(matches!(result, Err(AudioError::InvalidSource(_))));
        assert_eq!(backend.http_client.request_count(), 0);
    }
}
