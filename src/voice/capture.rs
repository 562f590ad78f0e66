//! Microphone capture and recording sessions

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// State of the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// Not capturing
    Idle,
    /// Capturing audio fragments
    Recording,
}

/// Ordered audio fragments captured between one start and stop
///
/// Fragments are kept distinct until finalization so their arrival order
/// and content are preserved exactly.
#[derive(Debug, Default)]
pub struct RecordingSession {
    fragments: Vec<Vec<f32>>,
}

impl RecordingSession {
    /// Append a captured fragment
    pub fn push(&mut self, fragment: &[f32]) {
        self.fragments.push(fragment.to_vec());
    }

    /// Number of fragments captured so far
    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Whether any audio was captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.iter().all(Vec::is_empty)
    }

    /// Concatenate all fragments in arrival order into one payload
    #[must_use]
    pub fn finalize(self) -> Vec<f32> {
        self.fragments.into_iter().flatten().collect()
    }
}

/// Captures audio from the default input device
///
/// Two states only: Idle and Recording. At most one session buffer is alive
/// at a time; `start` replaces the previous one.
pub struct Recorder {
    device: Device,
    config: StreamConfig,
    session: Arc<Mutex<RecordingSession>>,
    stream: Option<Stream>,
}

impl Recorder {
    /// Create a new recorder bound to the default input device
    ///
    /// # Errors
    ///
    /// Returns error if no input device is available (possibly denied) or
    /// no suitable capture config exists
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Permission("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Permission(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable capture config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            channels = config.channels,
            "recorder initialized"
        );

        Ok(Self {
            device,
            config,
            session: Arc::new(Mutex::new(RecordingSession::default())),
            stream: None,
        })
    }

    /// Start a new recording session
    ///
    /// Calling while already recording is an explicit no-op.
    ///
    /// # Errors
    ///
    /// Returns `Error::Permission` if the capture device rejects the stream,
    /// `Error::Audio` for other device failures
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let session = Arc::new(Mutex::new(RecordingSession::default()));
        let callback_session = Arc::clone(&session);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut session) = callback_session.lock() {
                        session.push(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| match e {
                cpal::BuildStreamError::DeviceNotAvailable => Error::Permission(e.to_string()),
                other => Error::Audio(other.to_string()),
            })?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        self.session = session;
        self.stream = Some(stream);

        tracing::debug!("recording started");
        Ok(())
    }

    /// Stop the active recording session and return it for upload
    ///
    /// The input stream is torn down before the session buffer is taken, so
    /// every fragment delivered by the device precedes finalization. Returns
    /// `None` (no-op) if no session is active.
    pub fn stop(&mut self) -> Option<RecordingSession> {
        let stream = self.stream.take()?;
        drop(stream);

        let session = self
            .session
            .lock()
            .map(|mut s| std::mem::take(&mut *s))
            .unwrap_or_default();

        tracing::debug!(fragments = session.fragment_count(), "recording stopped");
        Some(session)
    }

    /// Current recorder state
    #[must_use]
    pub const fn state(&self) -> RecorderState {
        if self.stream.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    /// Check if currently recording
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    /// Get the capture sample rate
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }
}

/// Convert f32 samples to WAV bytes for upload
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            // Convert f32 [-1.0, 1.0] to i16
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
