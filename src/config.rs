//! Configuration for the voice client

use crate::{Error, Result};

/// Default origin of the transcription service
pub const DEFAULT_SERVICE_ORIGIN: &str = "http://127.0.0.1:8000";

/// Path of the transcription endpoint, relative to the service origin
pub const TRANSCRIBE_PATH: &str = "/api/transcribe/";

/// Display name shown next to the assistant's responses
pub const ASSISTANT_NAME: &str = "Sophia";

/// Voice client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Origin of the transcription service (scheme + host + port, no path)
    pub service_origin: String,

    /// Assistant display name
    pub assistant_name: String,
}

impl Config {
    /// Create a configuration for the given service origin
    ///
    /// A trailing slash on the origin is stripped so that relative audio
    /// paths returned by the service concatenate cleanly.
    ///
    /// # Errors
    ///
    /// Returns error if the origin is empty or not an http(s) URL
    pub fn new(service_origin: &str) -> Result<Self> {
        let origin = service_origin.trim_end_matches('/');

        if origin.is_empty() {
            return Err(Error::Config("service origin must not be empty".to_string()));
        }

        if !origin.starts_with("http://") && !origin.starts_with("https://") {
            return Err(Error::Config(format!(
                "service origin must be an http(s) URL, got: {origin}"
            )));
        }

        Ok(Self {
            service_origin: origin.to_string(),
            assistant_name: ASSISTANT_NAME.to_string(),
        })
    }

    /// Full URL of the transcription endpoint
    #[must_use]
    pub fn transcribe_url(&self) -> String {
        format!("{}{TRANSCRIBE_PATH}", self.service_origin)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_origin: DEFAULT_SERVICE_ORIGIN.to_string(),
            assistant_name: ASSISTANT_NAME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let config = Config::default();
        assert_eq!(config.transcribe_url(), "http://127.0.0.1:8000/api/transcribe/");
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let config = Config::new("http://localhost:9000/").unwrap();
        assert_eq!(config.service_origin, "http://localhost:9000");
        assert_eq!(config.transcribe_url(), "http://localhost:9000/api/transcribe/");
    }

    #[test]
    fn test_rejects_empty_origin() {
        assert!(Config::new("").is_err());
        assert!(Config::new("/").is_err());
    }

    #[test]
    fn test_rejects_non_http_origin() {
        assert!(Config::new("ftp://example.com").is_err());
        assert!(Config::new("localhost:8000").is_err());
    }
}
