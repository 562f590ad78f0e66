//! Client for the remote transcription/response service
//!
//! One multipart POST per finished recording; the service answers with the
//! assistant's text and a relative path to the synthesized reply audio.

use crate::config::Config;
use crate::{Error, Result};

/// Multipart field name the service expects the recording under
const AUDIO_FIELD: &str = "audio";

/// Filename tag for the uploaded recording
const AUDIO_FILENAME: &str = "audio.wav";

/// Raw response body from the transcription endpoint
#[derive(serde::Deserialize)]
struct TranscribeBody {
    #[serde(default)]
    text: String,
    #[serde(default)]
    audio_url: Option<String>,
}

/// Assistant response: text plus the resolved reply-audio URL
///
/// Replaces any prior value; no history is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    /// Response text to display
    pub text: String,
    /// Absolute URL of the synthesized reply audio
    pub audio_url: String,
}

/// Talks to the transcription/response service
pub struct TranscribeClient {
    client: reqwest::Client,
    origin: String,
    endpoint: String,
}

impl TranscribeClient {
    /// Create a client for the configured service
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            origin: config.service_origin.clone(),
            endpoint: config.transcribe_url(),
        }
    }

    /// Upload a finished recording and parse the assistant's reply
    ///
    /// Issues exactly one POST; there is no retry.
    ///
    /// # Errors
    ///
    /// Returns `Error::Request` on a non-success status and
    /// `Error::MissingField` if the success body lacks `audio_url`
    pub async fn transcribe(&self, wav: Vec<u8>) -> Result<AssistantReply> {
        tracing::debug!(audio_bytes = wav.len(), endpoint = %self.endpoint, "uploading recording");

        let form = reqwest::multipart::Form::new().part(
            AUDIO_FIELD,
            reqwest::multipart::Part::bytes(wav)
                .file_name(AUDIO_FILENAME)
                .mime_str("audio/wav")
                .map_err(|e| Error::Audio(e.to_string()))?,
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Request { status, body });
        }

        let body = response.text().await?;
        let reply = parse_reply(&body, &self.origin)?;

        tracing::info!(text = %reply.text, audio_url = %reply.audio_url, "assistant replied");
        Ok(reply)
    }

    /// Download the synthesized reply audio
    ///
    /// # Errors
    ///
    /// Returns `Error::Request` on a non-success status
    pub async fn fetch_reply_audio(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Request { status, body });
        }

        let bytes = response.bytes().await?;
        tracing::debug!(audio_bytes = bytes.len(), "reply audio downloaded");
        Ok(bytes.to_vec())
    }
}

/// Parse a success response body into an assistant reply
///
/// # Errors
///
/// Returns `Error::MissingField` if `audio_url` is absent
pub fn parse_reply(body: &str, origin: &str) -> Result<AssistantReply> {
    let parsed: TranscribeBody = serde_json::from_str(body)?;

    let path = parsed.audio_url.ok_or(Error::MissingField("audio_url"))?;

    Ok(AssistantReply {
        text: parsed.text,
        audio_url: resolve_audio_url(origin, &path),
    })
}

/// Build the absolute playback URL from the service origin and a relative path
#[must_use]
pub fn resolve_audio_url(origin: &str, path: &str) -> String {
    format!("{origin}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "http://127.0.0.1:8000";

    #[test]
    fn test_parse_reply() {
        let reply =
            parse_reply(r#"{"text":"hello","audio_url":"/media/out.mp3"}"#, ORIGIN).unwrap();

        assert_eq!(reply.text, "hello");
        assert_eq!(reply.audio_url, "http://127.0.0.1:8000/media/out.mp3");
    }

    #[test]
    fn test_parse_reply_missing_audio_url() {
        let err = parse_reply(r#"{"text":"hi"}"#, ORIGIN).unwrap_err();
        assert!(matches!(err, Error::MissingField("audio_url")));
    }

    #[test]
    fn test_parse_reply_null_audio_url() {
        let err = parse_reply(r#"{"text":"hi","audio_url":null}"#, ORIGIN).unwrap_err();
        assert!(matches!(err, Error::MissingField("audio_url")));
    }

    #[test]
    fn test_parse_reply_missing_text_defaults_empty() {
        let reply = parse_reply(r#"{"audio_url":"/media/out.mp3"}"#, ORIGIN).unwrap();
        assert_eq!(reply.text, "");
    }

    #[test]
    fn test_parse_reply_invalid_json() {
        assert!(parse_reply("not json", ORIGIN).is_err());
    }

    #[test]
    fn test_resolve_audio_url() {
        assert_eq!(
            resolve_audio_url(ORIGIN, "/media/out.mp3"),
            "http://127.0.0.1:8000/media/out.mp3"
        );
    }
}
