//! Device audio output.
//!
//! [`DeviceTrack`] plays decoded narration audio on the default output
//! device through `cpal`. A `cpal::Stream` must stay on the thread that
//! created it, so each track owns a small output thread that holds the
//! stream until the track is dropped. The track and the device callback
//! share a playhead guarded by a mutex.
//!
//! Playback rate is applied by stepping through the source frames faster or
//! slower with linear interpolation, which also converts between the source
//! and device sample rates.

use std::fmt;
use std::sync::mpsc;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use parking_lot::Mutex;

use super::audio::{AudioError, AudioTrack};

/// Where opened audio is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioOutput {
    /// The system's default output device.
    #[default]
    Device,
    /// No device; the playhead follows the clock only.
    Silent,
}

impl AudioOutput {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioOutput::Device => "device",
            AudioOutput::Silent => "silent",
        }
    }

    pub fn from_config_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "device" => Some(AudioOutput::Device),
            "silent" => Some(AudioOutput::Silent),
            _ => None,
        }
    }
}

impl fmt::Display for AudioOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interleaved `f32` samples for a whole audio file.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

impl DecodedAudio {
    pub fn new(samples: Vec<f32>, channels: usize, sample_rate: u32) -> Result<Self, AudioError> {
        if channels == 0 || sample_rate == 0 || samples.len() < channels {
            return Err(AudioError::LoadFailure("audio has no duration".to_string()));
        }
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of complete frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Sample for an output channel. Output channels beyond the source's
    /// channel count repeat the last source channel.
    fn sample(&self, frame: usize, channel: usize) -> f32 {
        let channel = channel.min(self.channels - 1);
        self.samples
            .get(frame * self.channels + channel)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Read position shared between a [`DeviceTrack`] and its device callback.
#[derive(Debug)]
struct Playhead {
    /// Fractional source frame.
    frame: f64,
    rate: f64,
    playing: bool,
}

impl Default for Playhead {
    fn default() -> Self {
        Self {
            frame: 0.0,
            rate: 1.0,
            playing: false,
        }
    }
}

impl Playhead {
    /// Fills `out` with `channels`-wide frames. `step` is the number of
    /// source frames per device frame at rate 1.0.
    fn render<T>(&mut self, audio: &DecodedAudio, step: f64, channels: usize, out: &mut [T])
    where
        T: Sample + FromSample<f32>,
    {
        let frames = audio.frames();
        let end = frames as f64;

        for slot in out.chunks_mut(channels.max(1)) {
            if !self.playing || self.frame >= end {
                slot.fill(T::EQUILIBRIUM);
                continue;
            }

            let index = self.frame as usize;
            let fraction = (self.frame - index as f64) as f32;
            let next = (index + 1).min(frames - 1);
            for (channel, sample) in slot.iter_mut().enumerate() {
                let a = audio.sample(index, channel);
                let b = audio.sample(next, channel);
                *sample = T::from_sample(a + (b - a) * fraction);
            }

            self.frame = (self.frame + step * self.rate).min(end);
        }
    }
}

/// An [`AudioTrack`] playing on an output device.
pub struct DeviceTrack {
    audio: Arc<DecodedAudio>,
    playhead: Arc<Mutex<Playhead>>,
    // Dropping the sender stops the output thread and closes the stream.
    _output: Option<mpsc::Sender<()>>,
}

impl DeviceTrack {
    /// Opens the default output device for `audio`. Blocks until the device
    /// stream is running or has failed to start.
    pub fn open(audio: Arc<DecodedAudio>) -> Result<Self, AudioError> {
        let playhead = Arc::new(Mutex::new(Playhead::default()));
        let output = spawn_output(Arc::clone(&audio), Arc::clone(&playhead))?;

        Ok(Self {
            audio,
            playhead,
            _output: Some(output),
        })
    }

    #[cfg(test)]
    fn detached(audio: DecodedAudio) -> Self {
        Self {
            audio: Arc::new(audio),
            playhead: Arc::new(Mutex::new(Playhead::default())),
            _output: None,
        }
    }
}

impl AudioTrack for DeviceTrack {
    fn duration(&self) -> Option<f64> {
        Some(self.audio.duration())
    }

    fn position(&self) -> f64 {
        let frame = self.playhead.lock().frame;
        (frame / self.audio.sample_rate() as f64).clamp(0.0, self.audio.duration())
    }

    fn play(&mut self) {
        self.playhead.lock().playing = true;
    }

    fn pause(&mut self) {
        self.playhead.lock().playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playhead.lock().playing
    }

    fn seek(&mut self, seconds: f64) {
        let seconds = seconds.clamp(0.0, self.audio.duration());
        self.playhead.lock().frame = seconds * self.audio.sample_rate() as f64;
    }

    fn set_rate(&mut self, rate: f64) {
        self.playhead.lock().rate = rate;
    }
}

fn spawn_output(
    audio: Arc<DecodedAudio>,
    playhead: Arc<Mutex<Playhead>>,
) -> Result<mpsc::Sender<()>, AudioError> {
    let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), AudioError>>(1);
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    std::thread::Builder::new()
        .name("colombo-audio".to_string())
        .spawn(move || match start_stream(audio, playhead) {
            Ok(stream) => {
                let _ = ready_tx.send(Ok(()));
                // Returns once the track drops its sender.
                let _ = stop_rx.recv();
                drop(stream);
                tracing::debug!("Audio output closed");
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e));
            }
        })
        .map_err(|e| AudioError::Output(format!("failed to spawn audio thread: {}", e)))?;

    ready_rx
        .recv()
        .map_err(|_| AudioError::Output("audio thread exited".to_string()))??;
    Ok(stop_tx)
}

fn start_stream(
    audio: Arc<DecodedAudio>,
    playhead: Arc<Mutex<Playhead>>,
) -> Result<Stream, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::Output("no default output device".to_string()))?;
    let supported = device
        .default_output_config()
        .map_err(|e| AudioError::Output(format!("failed to get output config: {}", e)))?;

    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();
    let step = audio.sample_rate() as f64 / config.sample_rate.0 as f64;

    tracing::debug!(
        device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
        device_rate = config.sample_rate.0,
        device_channels = config.channels,
        source_rate = audio.sample_rate(),
        source_channels = audio.channels(),
        format = ?sample_format,
        "Opening audio output"
    );

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, audio, playhead, step)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, audio, playhead, step)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, audio, playhead, step)?,
        other => {
            return Err(AudioError::Output(format!(
                "unsupported sample format {:?}",
                other
            )))
        }
    };

    stream
        .play()
        .map_err(|e| AudioError::Output(format!("failed to start stream: {}", e)))?;
    Ok(stream)
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    audio: Arc<DecodedAudio>,
    playhead: Arc<Mutex<Playhead>>,
    step: f64,
) -> Result<Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                playhead.lock().render(&audio, step, channels, data);
            },
            |err| tracing::error!(error = %err, "Audio stream error"),
            None,
        )
        .map_err(|e| AudioError::Output(format!("failed to build stream: {}", e)))
}
