//! Assistant session controller
//!
//! Owns the recorder, the player, and the in-flight exchange task, so the
//! single-active-session and single-active-playback invariants hold by
//! construction.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::config::Config;
use crate::service::{AssistantReply, TranscribeClient};
use crate::voice::{Player, Recorder, SAMPLE_RATE, samples_to_wav};
use crate::Result;

/// State rendered by the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Whether a recording session is active
    pub recording: bool,

    /// Most recent assistant response text; empty until the first reply
    pub response_text: String,

    /// Write-only: set while a reply is being prepared, cleared once
    /// playback starts. The renderer never reads it.
    pub audio_url: String,
}

impl ViewState {
    /// Apply a successful reply, replacing any previous response
    pub fn apply_reply(&mut self, reply: &AssistantReply) {
        self.response_text = reply.text.clone();
        self.audio_url = reply.audio_url.clone();
    }

    /// Clear the reply-audio URL once playback has started
    pub fn clear_audio_url(&mut self) {
        self.audio_url.clear();
    }
}

/// Voice assistant controller
///
/// Drives the Idle ↔ Recording toggle and, on each stop, runs one exchange
/// with the transcription service as a background task.
pub struct Assistant {
    config: Config,
    recorder: Recorder,
    player: Arc<Mutex<Player>>,
    client: Arc<TranscribeClient>,
    view: Arc<Mutex<ViewState>>,
    exchange: Option<JoinHandle<()>>,
}

impl Assistant {
    /// Create an assistant bound to the default audio devices
    ///
    /// # Errors
    ///
    /// Returns error if an audio device cannot be opened
    pub fn new(config: Config) -> Result<Self> {
        let client = Arc::new(TranscribeClient::new(&config));

        Ok(Self {
            config,
            recorder: Recorder::new()?,
            player: Arc::new(Mutex::new(Player::new()?)),
            client,
            view: Arc::new(Mutex::new(ViewState::default())),
            exchange: None,
        })
    }

    /// Toggle between recording and idle
    ///
    /// # Errors
    ///
    /// Returns error if the recorder cannot start or the recording cannot
    /// be packaged for upload
    pub fn toggle(&mut self) -> Result<()> {
        if self.recorder.is_recording() {
            self.stop_recording()
        } else {
            self.start_recording()
        }
    }

    /// Start a new recording session
    ///
    /// Any exchange still in flight from a previous session is aborted
    /// before capture begins.
    ///
    /// # Errors
    ///
    /// Returns error if the capture device rejects the stream
    pub fn start_recording(&mut self) -> Result<()> {
        if let Some(task) = self.exchange.take() {
            task.abort();
            tracing::debug!("in-flight exchange aborted by new session");
        }

        self.recorder.start()?;

        if let Ok(mut view) = self.view.lock() {
            view.recording = true;
        }

        tracing::info!("recording");
        Ok(())
    }

    /// Stop the active recording and fire one exchange with the service
    ///
    /// No-op when no session is active.
    ///
    /// # Errors
    ///
    /// Returns error if the recording cannot be encoded for upload
    pub fn stop_recording(&mut self) -> Result<()> {
        let Some(session) = self.recorder.stop() else {
            return Ok(());
        };

        if let Ok(mut view) = self.view.lock() {
            view.recording = false;
        }

        tracing::debug!(fragments = session.fragment_count(), "session finalized");
        let wav = samples_to_wav(&session.finalize(), SAMPLE_RATE)?;

        let client = Arc::clone(&self.client);
        let player = Arc::clone(&self.player);
        let view = Arc::clone(&self.view);

        self.exchange = Some(tokio::spawn(async move {
            if let Err(e) = run_exchange(&client, &player, &view, wav).await {
                tracing::error!(error = %e, "exchange failed");
            }
        }));

        Ok(())
    }

    /// Snapshot of the current view state
    #[must_use]
    pub fn view(&self) -> ViewState {
        self.view.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Check if a recording session is active
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Check if an exchange with the service is still running
    #[must_use]
    pub fn exchange_in_flight(&self) -> bool {
        self.exchange.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Assistant display name
    #[must_use]
    pub fn assistant_name(&self) -> &str {
        &self.config.assistant_name
    }
}

/// One exchange: upload, apply the reply, play the synthesized audio
///
/// Side-effect order on success: response text is made visible, any
/// current playback is stopped and rewound, then the new reply audio is
/// downloaded and started.
async fn run_exchange(
    client: &TranscribeClient,
    player: &Mutex<Player>,
    view: &Mutex<ViewState>,
    wav: Vec<u8>,
) -> Result<()> {
    let reply = client.transcribe(wav).await?;

    if let Ok(mut view) = view.lock() {
        view.apply_reply(&reply);
    }

    let audio = client.fetch_reply_audio(&reply.audio_url).await?;

    if let Ok(mut player) = player.lock() {
        player.play_mp3(&audio)?;
    }

    if let Ok(mut view) = view.lock() {
        view.clear_audio_url();
    }

    Ok(())
}
