//! Conversation session: message log, recording state and the flow of
//! user actions to the backend and back.

pub mod controller;
pub mod events;
pub mod runtime;

pub use controller::{ChatTurn, SessionController, EVENT_CAPACITY};
pub use events::{Notice, NoticeKind, SessionEvent};
pub use runtime::{SessionCommand, SessionHandle, SessionRuntime};
