//! Voice processing module
//!
//! Handles microphone capture and playback of synthesized replies.
//! The upload to the transcription service lives in `service`.

mod capture;
mod playback;

pub use capture::{Recorder, RecorderState, RecordingSession, SAMPLE_RATE, samples_to_wav};
pub use playback::{PlaybackHandle, Player};
