//! Command loop driving a [`SessionController`] from a UI thread
//!
//! The UI sends [`SessionCommand`]s and polls [`SessionEvent`]s. The handle
//! owns the session's only event receiver; a UI that wants events on another
//! thread takes it with [`SessionHandle::take_event_receiver`]. One worker
//! thread consumes commands in order: the synchronous part of every command
//! runs on that thread, and network calls are spawned onto its tokio
//! runtime so the loop keeps accepting commands while replies are pending.

use super::controller::SessionController;
use super::events::{Notice, NoticeKind, SessionEvent};
use crate::capture::ImageSource;
use crate::settings::SettingField;
use crate::{MurmurError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, error, info};

/// Commands that can be sent to the session
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Start recording voice input
    StartRecording,

    /// Stop recording and transcribe into the draft
    StopRecording,

    /// Start or stop, depending on the state when the worker handles it
    ToggleRecording,

    /// Replace the draft buffer
    SetDraft(String),

    /// Send the draft buffer as a text message
    SendDraft,

    /// Send the given text as a message
    SendText(String),

    /// Send an image with an optional caption
    SendImage { uri: String, text: Option<String> },

    /// Acquire an image and send it
    CaptureImage(ImageSource),

    /// Flip the speaker toggle
    ToggleSpeaker,

    /// Change a model setting by identifier
    UpdateSetting { field: SettingField, value: String },

    /// Stop the worker
    Shutdown,
}

/// Handle for controlling a running session from the UI
pub struct SessionHandle {
    command_tx: Sender<SessionCommand>,
    event_rx: Option<Receiver<SessionEvent>>,
    controller: SessionController,
    worker: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Send a command to the session worker
    pub fn send_command(&self, cmd: SessionCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| MurmurError::Channel(format!("Failed to send command: {}", e)))
    }

    /// Try to receive an event without blocking.
    ///
    /// Always `None` once the receiver has been taken.
    pub fn try_recv_event(&self) -> Option<SessionEvent> {
        self.event_rx.as_ref()?.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<SessionEvent> {
        match self.event_rx.as_ref()?.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Move the event receiver out, e.g. into a printer thread.
    ///
    /// Returns `None` if it was already taken.
    pub fn take_event_receiver(&mut self) -> Option<Receiver<SessionEvent>> {
        self.event_rx.take()
    }

    /// Read-only access to session state
    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Stop the worker and wait for it to exit. In-flight replies are dropped.
    pub fn shutdown(mut self) -> Result<()> {
        let _ = self.command_tx.send(SessionCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| MurmurError::Channel("Session worker panicked".into()))?;
        }
        Ok(())
    }
}

/// Starts the session worker
pub struct SessionRuntime;

impl SessionRuntime {
    /// Spawn the worker thread for `controller` and return its handle.
    ///
    /// `events` is the receiver returned alongside the controller.
    pub fn start(
        controller: SessionController,
        events: Receiver<SessionEvent>,
    ) -> Result<SessionHandle> {
        let (command_tx, command_rx) = bounded(100);
        let worker_controller = controller.clone();

        // Build the runtime up front so a failure is reported to the caller
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("murmur-session")
            .enable_all()
            .build()
            .map_err(|e| MurmurError::Channel(format!("Failed to create tokio runtime: {}", e)))?;

        let worker = thread::Builder::new()
            .name("murmur-commands".into())
            .spawn(move || run_loop(runtime, worker_controller, command_rx))
            .map_err(|e| MurmurError::Channel(format!("Failed to spawn session worker: {}", e)))?;

        Ok(SessionHandle {
            command_tx,
            event_rx: Some(events),
            controller,
            worker: Some(worker),
        })
    }
}

fn run_loop(runtime: Runtime, controller: SessionController, command_rx: Receiver<SessionCommand>) {
    info!("Session worker started");

    loop {
        let cmd = match command_rx.recv() {
            Ok(cmd) => cmd,
            Err(_) => {
                debug!("Command channel disconnected");
                break;
            }
        };
        debug!("Session command: {:?}", cmd);

        match cmd {
            SessionCommand::StartRecording => {
                // Inline so a following StopRecording always sees the started capture
                let _ = runtime.block_on(controller.start_recording());
            }
            SessionCommand::StopRecording => stop_recording(&runtime, &controller),
            SessionCommand::ToggleRecording if controller.is_recording() => {
                stop_recording(&runtime, &controller)
            }
            SessionCommand::ToggleRecording => {
                let _ = runtime.block_on(controller.start_recording());
            }
            SessionCommand::SetDraft(text) => controller.set_draft(text),
            SessionCommand::SendDraft => {
                if let Some(turn) = controller.begin_draft() {
                    let controller = controller.clone();
                    runtime.spawn(async move {
                        let _ = controller.complete_turn(turn).await;
                    });
                }
            }
            SessionCommand::SendText(text) => {
                if let Some(turn) = controller.begin_text(&text) {
                    let controller = controller.clone();
                    runtime.spawn(async move {
                        let _ = controller.complete_turn(turn).await;
                    });
                }
            }
            SessionCommand::SendImage { uri, text } => {
                let turn = controller.begin_image(&uri, text.as_deref());
                let controller = controller.clone();
                runtime.spawn(async move {
                    let _ = controller.complete_turn(turn).await;
                });
            }
            SessionCommand::CaptureImage(source) => {
                let controller = controller.clone();
                runtime.spawn(async move {
                    let _ = controller.capture_image(source).await;
                });
            }
            SessionCommand::ToggleSpeaker => {
                controller.toggle_speaker();
            }
            SessionCommand::UpdateSetting { field, value } => {
                if let Err(e) = controller.settings().set(field, &value) {
                    error!("Setting update rejected: {}", e);
                    controller.publish(SessionEvent::Notice(Notice::new(
                        NoticeKind::InvalidSetting,
                        &e,
                    )));
                }
            }
            SessionCommand::Shutdown => {
                info!("Session shutdown requested");
                break;
            }
        }
    }

    runtime.shutdown_timeout(Duration::from_millis(500));
    info!("Session worker stopped");
}

/// Finalize inline, transcribe in the background
fn stop_recording(runtime: &Runtime, controller: &SessionController) {
    if let Ok(Some(audio)) = runtime.block_on(controller.finish_recording()) {
        let controller = controller.clone();
        runtime.spawn(async move {
            let _ = controller.transcribe_recording(&audio).await;
        });
    }
}
