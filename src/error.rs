//! Error types for the Sophia voice client

use thiserror::Error;

/// Result type alias for Sophia operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the voice client
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Capture device access denied or unavailable
    #[error("permission error: {0}")]
    Permission(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Transcription service returned a non-success status
    #[error("request error: service responded with {status}: {body}")]
    Request {
        /// HTTP status returned by the service
        status: reqwest::StatusCode,
        /// Response body, for diagnostics
        body: String,
    },

    /// Success response missing an expected field
    #[error("missing field in service response: {0}")]
    MissingField(&'static str),

    /// Audio playback rejected by the output device
    #[error("playback error: {0}")]
    Playback(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
