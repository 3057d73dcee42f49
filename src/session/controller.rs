//! Session controller
//!
//! Owns the message log, the recording flag, the speaker toggle and the
//! draft buffer, and is the only writer of any of them.
//!
//! Chat sends are split in two phases. [`SessionController::begin_text`] and
//! [`SessionController::begin_image`] append the user's message right away
//! and return a [`ChatTurn`]; [`SessionController::complete_turn`] performs
//! the network call and appends the reply whenever it resolves. Several
//! turns may be in flight at once: user messages keep the order in which
//! they were begun, replies land at the tail in resolution order.
//!
//! Events go to a single consumer: the receiver returned by
//! [`SessionController::new`]. The channel holds [`EVENT_CAPACITY`] events;
//! once it is full, or the receiver is gone, further events are dropped.

use super::events::{Notice, NoticeKind, SessionEvent};
use crate::backend::{BackendClient, ChatRequest};
use crate::capture::{AudioFormat, ImageSource, MediaCapture};
use crate::messages::{ImageRef, Message, MessageContent, MessageId, MessageLog, Role};
use crate::settings::SettingsStore;
use crate::speech::SpeechOutput;
use crate::{MurmurError, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Events buffered for a consumer that has fallen behind
pub const EVENT_CAPACITY: usize = 100;

/// Mutable session flags, guarded together
#[derive(Debug, Default)]
struct SessionFlags {
    recording: bool,
    speaker_enabled: bool,
    draft: String,
}

/// A chat request whose user message is already in the log
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// Tracking id for logs
    pub id: Uuid,
    /// The user message this turn answers
    pub prompt: MessageId,
    pub request: ChatRequest,
    /// Speaker state sampled when the turn began
    pub speak_reply: bool,
}

struct Inner {
    log: MessageLog,
    flags: Mutex<SessionFlags>,
    settings: SettingsStore,
    audio_format: AudioFormat,
    backend: Arc<dyn BackendClient>,
    capture: Arc<dyn MediaCapture>,
    speech: Arc<dyn SpeechOutput>,
    event_tx: Sender<SessionEvent>,
}

/// Handle to one conversation session. Clones share the same session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    /// Create a session and the receiver for its events
    pub fn new(
        settings: SettingsStore,
        backend: Arc<dyn BackendClient>,
        capture: Arc<dyn MediaCapture>,
        speech: Arc<dyn SpeechOutput>,
    ) -> (Self, Receiver<SessionEvent>) {
        Self::with_audio_format(settings, backend, capture, speech, AudioFormat::default())
    }

    pub fn with_audio_format(
        settings: SettingsStore,
        backend: Arc<dyn BackendClient>,
        capture: Arc<dyn MediaCapture>,
        speech: Arc<dyn SpeechOutput>,
        audio_format: AudioFormat,
    ) -> (Self, Receiver<SessionEvent>) {
        let (event_tx, event_rx) = bounded(EVENT_CAPACITY);
        let controller = Self {
            inner: Arc::new(Inner {
                log: MessageLog::new(),
                flags: Mutex::new(SessionFlags::default()),
                settings,
                audio_format,
                backend,
                capture,
                speech,
                event_tx,
            }),
        };
        (controller, event_rx)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.log.snapshot()
    }

    pub fn log(&self) -> &MessageLog {
        &self.inner.log
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.inner.settings
    }

    pub fn is_recording(&self) -> bool {
        self.inner.flags.lock().recording
    }

    pub fn speaker_enabled(&self) -> bool {
        self.inner.flags.lock().speaker_enabled
    }

    pub fn draft(&self) -> String {
        self.inner.flags.lock().draft.clone()
    }

    /// Replace the draft buffer (user typing)
    pub fn set_draft(&self, text: impl Into<String>) {
        let text = text.into();
        self.inner.flags.lock().draft = text.clone();
        self.publish(SessionEvent::DraftChanged(text));
    }

    /// Flip the speaker toggle and return the new state
    pub fn toggle_speaker(&self) -> bool {
        let enabled = {
            let mut flags = self.inner.flags.lock();
            flags.speaker_enabled = !flags.speaker_enabled;
            flags.speaker_enabled
        };
        debug!("Speaker {}", if enabled { "on" } else { "off" });
        self.publish(SessionEvent::SpeakerToggled(enabled));
        enabled
    }

    // ---- recording ----

    /// Idle -> Recording.
    ///
    /// Calling this while already recording is a caller error; it is logged
    /// and ignored. Failures are published as a [`Notice`] before being
    /// returned.
    pub async fn start_recording(&self) -> Result<()> {
        if self.is_recording() {
            warn!("start_recording called while already recording");
            return Ok(());
        }

        if !self.inner.capture.request_audio_permission().await {
            let err = MurmurError::PermissionDenied("Microphone".into());
            self.notify(NoticeKind::PermissionDenied, &err);
            return Err(err);
        }

        if let Err(e) = self
            .inner
            .capture
            .start_audio_capture(self.inner.audio_format)
            .await
        {
            error!("Failed to start recording: {}", e);
            self.notify(NoticeKind::CaptureFailure, &e);
            return Err(e);
        }

        self.inner.flags.lock().recording = true;
        info!("Recording started");
        self.publish(SessionEvent::RecordingStarted);
        Ok(())
    }

    /// Recording -> Idle, then transcribe into the draft buffer.
    ///
    /// Returns the transcript, or `None` when nothing was being recorded.
    pub async fn stop_recording(&self) -> Result<Option<String>> {
        match self.finish_recording().await? {
            Some(audio) => self.transcribe_recording(&audio).await.map(Some),
            None => Ok(None),
        }
    }

    /// Finalize the capture without transcribing.
    ///
    /// The recording flag is cleared whether or not finalizing succeeds.
    pub async fn finish_recording(&self) -> Result<Option<PathBuf>> {
        if !self.is_recording() {
            warn!("stop_recording called while idle");
            return Ok(None);
        }

        let result = self.inner.capture.stop_audio_capture().await;
        self.inner.flags.lock().recording = false;
        self.publish(SessionEvent::RecordingStopped);

        match result {
            Ok(path) => {
                info!("Recording saved: {}", path.display());
                Ok(Some(path))
            }
            Err(e) => {
                error!("Failed to finalize recording: {}", e);
                self.notify(NoticeKind::CaptureFailure, &e);
                Err(e)
            }
        }
    }

    /// Transcribe a finished recording into the draft buffer.
    ///
    /// The transcript is not sent; on failure the draft is left untouched.
    pub async fn transcribe_recording(&self, audio: &Path) -> Result<String> {
        let model = self.inner.settings.speech_model();
        debug!("Transcribing {} with {}", audio.display(), model);

        match self.inner.backend.transcribe(audio, model).await {
            Ok(transcript) => {
                info!("Transcription: {}", transcript);
                self.set_draft(transcript.clone());
                Ok(transcript)
            }
            Err(e) => {
                warn!("Transcription failed: {}", e);
                self.notify(NoticeKind::TranscriptionFailure, &e);
                Err(e)
            }
        }
    }

    // ---- chat ----

    /// Send text and wait for the reply.
    ///
    /// `Ok(None)` when the text is blank (nothing happens), otherwise the
    /// appended assistant message.
    pub async fn send_text(&self, text: &str) -> Result<Option<Message>> {
        match self.begin_text(text) {
            Some(turn) => self.complete_turn(turn).await.map(Some),
            None => Ok(None),
        }
    }

    /// Send whatever is in the draft buffer
    pub async fn send_draft(&self) -> Result<Option<Message>> {
        let draft = self.draft();
        self.send_text(&draft).await
    }

    /// Send an image (with optional caption) and wait for the reply
    pub async fn send_image(&self, uri: &str, text: Option<&str>) -> Result<Message> {
        let turn = self.begin_image(uri, text);
        self.complete_turn(turn).await
    }

    /// Acquire one image from `source` and send it without text.
    ///
    /// Returns `Ok(None)` when the user cancelled the picker.
    pub async fn capture_image(&self, source: ImageSource) -> Result<Option<Message>> {
        if source == ImageSource::Camera && !self.inner.capture.request_camera_permission().await {
            let err = MurmurError::PermissionDenied("Camera".into());
            self.notify(NoticeKind::PermissionDenied, &err);
            return Err(err);
        }

        let uri = match self.inner.capture.pick_image(source).await {
            Ok(Some(uri)) => uri,
            Ok(None) => {
                debug!("Image pick from {} cancelled", source);
                return Ok(None);
            }
            Err(e) => {
                error!("Image capture from {} failed: {}", source, e);
                self.notify(NoticeKind::CaptureFailure, &e);
                return Err(e);
            }
        };

        self.send_image(&uri, None).await.map(Some)
    }

    /// Synchronous half of a text send: guard, append, clear the draft.
    ///
    /// Returns `None` for empty or whitespace-only text.
    pub fn begin_text(&self, text: &str) -> Option<ChatTurn> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring empty send");
            return None;
        }

        let prompt = self.append(Role::User, MessageContent::Text(text.to_string()));
        self.set_draft(String::new());

        let request = ChatRequest::text(self.inner.settings.chat_model(), text);
        Some(self.turn(prompt.id, request))
    }

    /// Synchronous half of a send: appends the draft as a user message
    pub fn begin_draft(&self) -> Option<ChatTurn> {
        let draft = self.draft();
        self.begin_text(&draft)
    }

    /// Synchronous half of an image send: appends the image message
    pub fn begin_image(&self, uri: &str, text: Option<&str>) -> ChatTurn {
        let image = ImageRef::new(uri);
        let prompt = self.append(Role::User, MessageContent::Image(image.clone()));

        let request = ChatRequest::image(
            self.inner.settings.chat_model(),
            image,
            text.map(str::to_string),
        );
        self.turn(prompt.id, request)
    }

    /// Network half of a send: call the backend and append the reply.
    ///
    /// On failure no assistant message is appended, so the user's message
    /// stays visibly unanswered.
    pub async fn complete_turn(&self, turn: ChatTurn) -> Result<Message> {
        debug!("Turn {} waiting for reply to {}", turn.id, turn.prompt);

        match self.inner.backend.chat(&turn.request).await {
            Ok(reply) => {
                let message = self.append(Role::Assistant, MessageContent::Text(reply.clone()));
                if turn.speak_reply {
                    self.inner.speech.speak(&reply);
                }
                Ok(message)
            }
            Err(e) => {
                error!("Turn {} failed: {}", turn.id, e);
                self.notify(NoticeKind::ChatFailure, &e);
                Err(e)
            }
        }
    }

    // ---- internals ----

    fn turn(&self, prompt: MessageId, request: ChatRequest) -> ChatTurn {
        ChatTurn {
            id: Uuid::new_v4(),
            prompt,
            request,
            speak_reply: self.speaker_enabled(),
        }
    }

    fn append(&self, role: Role, content: MessageContent) -> Message {
        let message = self.inner.log.append(role, content);
        debug!("Appended {:?} {:?} message {}", message.role, message.kind(), message.id);
        self.publish(SessionEvent::MessageAppended(message.clone()));
        message
    }

    fn notify(&self, kind: NoticeKind, error: &MurmurError) {
        self.publish(SessionEvent::Notice(Notice::new(kind, error)));
    }

    pub(crate) fn publish(&self, event: SessionEvent) {
        match self.inner.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("Event queue full, dropping {:?}", event);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}
