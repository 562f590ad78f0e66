//! Audio playback of synthesized replies

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::{Error, Result};

/// Sample rate for playback (matches common TTS output)
const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// Handle to the currently playing reply
///
/// At most one handle is alive at a time; the [`Player`] stops and discards
/// the previous handle before creating a new one. The handle carries only
/// the shared cancel flag and play position; the output stream itself lives
/// on a dedicated playback thread.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    cancel: Arc<AtomicBool>,
    position: Arc<AtomicUsize>,
}

impl PlaybackHandle {
    fn new() -> Self {
        Self {
            cancel: Arc::new(AtomicBool::new(false)),
            position: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Stop playback and rewind to the start
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::Relaxed);
        self.position.store(0, Ordering::Relaxed);
    }

    /// Whether this handle has been stopped
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Current play position in samples
    #[must_use]
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Relaxed)
    }
}

/// Plays synthesized replies to the default output device
///
/// Owns the single active [`PlaybackHandle`].
pub struct Player {
    config: StreamConfig,
    current: Option<PlaybackHandle>,
}

impl Player {
    /// Create a new player bound to the default output device
    ///
    /// # Errors
    ///
    /// Returns error if no output device or suitable config is available
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Playback("no output device available".to_string()))?;

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Playback(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
            .or_else(|| {
                // Fallback: try stereo
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                        && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
                })
            })
            .ok_or_else(|| Error::Playback("no suitable output config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = PLAYBACK_SAMPLE_RATE,
            channels = config.channels,
            "audio playback initialized"
        );

        Ok(Self {
            config,
            current: None,
        })
    }

    /// Stop the current playback, if any, and begin playing the given MP3
    ///
    /// # Errors
    ///
    /// Returns error if the MP3 data cannot be decoded
    pub fn play_mp3(&mut self, mp3_data: &[u8]) -> Result<()> {
        let samples = decode_mp3(mp3_data)?;
        self.play_samples(samples);
        Ok(())
    }

    /// Stop the current playback, if any, and begin playing raw samples
    ///
    /// Playback starts asynchronously on a dedicated thread; a failure to
    /// open the output stream there is logged, not returned.
    pub fn play_samples(&mut self, samples: Vec<f32>) {
        self.stop_current();

        if samples.is_empty() {
            tracing::debug!("reply audio decoded to zero samples, nothing to play");
            return;
        }

        let handle = PlaybackHandle::new();
        let cancel = Arc::clone(&handle.cancel);
        let position = Arc::clone(&handle.position);
        let config = self.config.clone();

        std::thread::spawn(move || {
            if let Err(e) = run_playback(samples, &config, &cancel, &position) {
                tracing::error!(error = %e, "audio playback failed");
            }
        });

        self.current = Some(handle);
    }

    /// Stop and discard the current playback handle, if any
    pub fn stop_current(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.stop();
            tracing::debug!("previous playback stopped");
        }
    }

    /// Whether a playback handle is currently held
    #[must_use]
    pub const fn has_active_playback(&self) -> bool {
        self.current.is_some()
    }
}

/// Feed samples to an output stream until done, cancelled, or timed out
fn run_playback(
    samples: Vec<f32>,
    config: &StreamConfig,
    cancel: &Arc<AtomicBool>,
    position: &Arc<AtomicUsize>,
) -> Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Playback("no output device".to_string()))?;

    let channels = usize::from(config.channels);
    let total = samples.len();
    let samples = Arc::new(samples);
    let finished = Arc::new(AtomicBool::new(false));

    let cb_samples = Arc::clone(&samples);
    let cb_cancel = Arc::clone(cancel);
    let cb_position = Arc::clone(position);
    let cb_finished = Arc::clone(&finished);

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let pos = cb_position.load(Ordering::Relaxed);
                    let sample = if cb_cancel.load(Ordering::Relaxed) || pos >= total {
                        cb_finished.store(true, Ordering::Relaxed);
                        0.0
                    } else {
                        cb_position.store(pos + 1, Ordering::Relaxed);
                        cb_samples[pos]
                    };

                    for out in frame.iter_mut() {
                        *out = sample;
                    }
                }
            },
            |err| {
                tracing::error!(error = %err, "audio playback error");
            },
            None,
        )
        .map_err(|e| Error::Playback(e.to_string()))?;

    stream.play().map_err(|e| Error::Playback(e.to_string()))?;

    // Poll for completion with a duration-based timeout
    let duration_ms = (total as u64 * 1000) / u64::from(PLAYBACK_SAMPLE_RATE);
    let timeout = std::time::Duration::from_millis(duration_ms + 500);
    let start = std::time::Instant::now();

    while !finished.load(Ordering::Relaxed) {
        if start.elapsed() > timeout {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }

    // Small delay to let the device drain
    std::thread::sleep(std::time::Duration::from_millis(100));

    drop(stream);
    tracing::debug!(samples = total, "playback complete");

    Ok(())
}

/// Decode MP3 bytes to f32 samples
fn decode_mp3(mp3_data: &[u8]) -> Result<Vec<f32>> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                // Convert i16 samples to f32 and handle stereo to mono
                let frame_samples: Vec<f32> = if frame.channels == 2 {
                    // Stereo: average channels
                    frame
                        .data
                        .chunks(2)
                        .map(|chunk| {
                            let left = f32::from(chunk[0]) / 32768.0;
                            let right =
                                f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                            f32::midpoint(left, right)
                        })
                        .collect()
                } else {
                    // Mono
                    frame.data.iter().map(|&s| f32::from(s) / 32768.0).collect()
                };

                samples.extend(frame_samples);
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Playback(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_stop_rewinds_position() {
        let handle = PlaybackHandle::new();
        handle.position.store(4242, Ordering::Relaxed);

        handle.stop();

        assert!(handle.is_stopped());
        assert_eq!(handle.position(), 0);
    }

    #[test]
    fn test_handle_starts_live() {
        let handle = PlaybackHandle::new();
        assert!(!handle.is_stopped());
        assert_eq!(handle.position(), 0);
    }

    #[test]
    fn test_decode_empty_input() {
        let samples = decode_mp3(&[]).unwrap();
        assert!(samples.is_empty());
    }
}
