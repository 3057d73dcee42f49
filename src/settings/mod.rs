//! User-selectable model settings
//!
//! The chat model and the speech-recognition model are both picked from a
//! fixed list. The store is handed to the session controller explicitly.

pub mod models;
pub mod store;

pub use models::{ChatModel, SettingField, Settings, SpeechModel};
pub use store::SettingsStore;
