//! Sophia - push-to-talk voice assistant client
//!
//! Records microphone audio, uploads it to a remote transcription/response
//! service, shows the assistant's text reply, and plays back the synthesized
//! audio answer.
//!
//! # Architecture
//!
//! ```text
//! keypress ──▶ Recorder (Idle ◀──▶ Recording)
//!                  │ stop
//!                  ▼
//!            exchange task ──▶ POST /api/transcribe/ ──▶ {text, audio_url}
//!                  │                                          │
//!                  ▼                                          ▼
//!            ViewState (text) ◀───────────────── Player (reply audio)
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod service;
pub mod ui;
pub mod voice;

pub use app::{Assistant, ViewState};
pub use config::Config;
pub use error::{Error, Result};
pub use service::{AssistantReply, TranscribeClient};
