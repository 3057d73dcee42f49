//! Fake collaborators shared by the session tests

#![allow(dead_code)]

use async_trait::async_trait;
use crossbeam_channel::Receiver;
use murmur::backend::{BackendClient, ChatRequest};
use murmur::capture::{AudioFormat, ImageSource, MediaCapture};
use murmur::session::{SessionController, SessionEvent};
use murmur::settings::{SettingsStore, SpeechModel};
use murmur::speech::SpeechOutput;
use murmur::{MurmurError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Scripted backend that records every call
#[derive(Default)]
pub struct FakeBackend {
    pub transcript: Mutex<Option<Result<String>>>,
    pub reply: Mutex<Option<Result<String>>>,
    pub transcribe_calls: Mutex<Vec<(PathBuf, SpeechModel)>>,
    pub chat_calls: Mutex<Vec<ChatRequest>>,
    /// Replies held back until released, keyed by message text
    gates: Mutex<HashMap<String, oneshot::Receiver<Result<String>>>>,
}

impl FakeBackend {
    pub fn replying(reply: &str) -> Arc<Self> {
        let backend = Self::default();
        *backend.reply.lock() = Some(Ok(reply.to_string()));
        Arc::new(backend)
    }

    pub fn failing() -> Arc<Self> {
        let backend = Self::default();
        *backend.reply.lock() = Some(Err(MurmurError::Chat("503 Service Unavailable".into())));
        *backend.transcript.lock() =
            Some(Err(MurmurError::Transcription("503 Service Unavailable".into())));
        Arc::new(backend)
    }

    pub fn with_transcript(self: Arc<Self>, transcript: &str) -> Arc<Self> {
        *self.transcript.lock() = Some(Ok(transcript.to_string()));
        self
    }

    /// Hold the reply to `message` until the returned sender fires
    pub fn gate(&self, message: &str) -> oneshot::Sender<Result<String>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(message.to_string(), rx);
        tx
    }

    pub fn chat_count(&self) -> usize {
        self.chat_calls.lock().len()
    }
}

#[async_trait]
impl BackendClient for FakeBackend {
    async fn transcribe(&self, audio: &Path, model: SpeechModel) -> Result<String> {
        self.transcribe_calls.lock().push((audio.to_path_buf(), model));
        self.transcript
            .lock()
            .clone()
            .unwrap_or_else(|| Err(MurmurError::Transcription("no transcript scripted".into())))
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        self.chat_calls.lock().push(request.clone());

        let gate = request
            .message
            .as_ref()
            .and_then(|m| self.gates.lock().remove(m));
        if let Some(gate) = gate {
            return gate
                .await
                .unwrap_or_else(|_| Err(MurmurError::Chat("gate dropped".into())));
        }

        self.reply
            .lock()
            .clone()
            .unwrap_or_else(|| Err(MurmurError::Chat("no reply scripted".into())))
    }
}

/// Capture adapter with fixed answers
pub struct FakeCapture {
    pub audio_permission: bool,
    pub camera_permission: bool,
    pub picked: Mutex<Result<Option<String>>>,
    pub stop_result: Mutex<Result<PathBuf>>,
    pub started_with: Mutex<Vec<AudioFormat>>,
    pub stops: Mutex<usize>,
    pub picks: Mutex<Vec<ImageSource>>,
    /// How long starting a capture takes
    pub start_delay: Duration,
}

impl Default for FakeCapture {
    fn default() -> Self {
        Self {
            audio_permission: true,
            camera_permission: true,
            picked: Mutex::new(Ok(None)),
            stop_result: Mutex::new(Ok(PathBuf::from("/tmp/recording.wav"))),
            started_with: Mutex::new(Vec::new()),
            stops: Mutex::new(0),
            picks: Mutex::new(Vec::new()),
            start_delay: Duration::ZERO,
        }
    }
}

impl FakeCapture {
    pub fn picking(uri: &str) -> Self {
        Self {
            picked: Mutex::new(Ok(Some(uri.to_string()))),
            ..Self::default()
        }
    }
}

#[async_trait]
impl MediaCapture for FakeCapture {
    async fn request_audio_permission(&self) -> bool {
        self.audio_permission
    }

    async fn request_camera_permission(&self) -> bool {
        self.camera_permission
    }

    async fn start_audio_capture(&self, format: AudioFormat) -> Result<()> {
        if !self.start_delay.is_zero() {
            tokio::time::sleep(self.start_delay).await;
        }
        self.started_with.lock().push(format);
        Ok(())
    }

    async fn stop_audio_capture(&self) -> Result<PathBuf> {
        *self.stops.lock() += 1;
        self.stop_result.lock().clone()
    }

    async fn pick_image(&self, source: ImageSource) -> Result<Option<String>> {
        self.picks.lock().push(source);
        self.picked.lock().clone()
    }
}

/// Speech output that remembers what it was asked to say
#[derive(Default)]
pub struct RecordingSpeaker {
    pub spoken: Mutex<Vec<String>>,
}

impl SpeechOutput for RecordingSpeaker {
    fn speak(&self, text: &str) {
        self.spoken.lock().push(text.to_string());
    }
}

pub struct Fixture {
    pub controller: SessionController,
    pub events: Receiver<SessionEvent>,
    pub backend: Arc<FakeBackend>,
    pub capture: Arc<FakeCapture>,
    pub speaker: Arc<RecordingSpeaker>,
    pub settings: SettingsStore,
}

pub fn fixture(backend: Arc<FakeBackend>, capture: FakeCapture) -> Fixture {
    let capture = Arc::new(capture);
    let speaker = Arc::new(RecordingSpeaker::default());
    let settings = SettingsStore::default();
    let (controller, events) = SessionController::new(
        settings.clone(),
        backend.clone(),
        capture.clone(),
        speaker.clone(),
    );
    Fixture {
        controller,
        events,
        backend,
        capture,
        speaker,
        settings,
    }
}
