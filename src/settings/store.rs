use super::models::{ChatModel, SettingField, Settings, SpeechModel};
use crate::Result;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared handle to the current [`Settings`].
///
/// All clones see the same value; a read always observes the last write.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    inner: Arc<RwLock<Settings>>,
}

impl SettingsStore {
    pub fn new(initial: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn get(&self) -> Settings {
        *self.inner.read()
    }

    pub fn chat_model(&self) -> ChatModel {
        self.inner.read().chat_model
    }

    pub fn speech_model(&self) -> SpeechModel {
        self.inner.read().speech_model
    }

    pub fn set_chat_model(&self, model: ChatModel) {
        self.inner.write().chat_model = model;
        info!("Chat model set to {}", model);
    }

    pub fn set_speech_model(&self, model: SpeechModel) {
        self.inner.write().speech_model = model;
        info!("Speech model set to {}", model);
    }

    /// Update a field from its string identifier.
    ///
    /// Values outside the field's closed set are rejected with
    /// `MurmurError::InvalidSetting` and the stored value is left as it was.
    pub fn set(&self, field: SettingField, value: &str) -> Result<()> {
        let result = match field {
            SettingField::ChatModel => value.parse::<ChatModel>().map(|m| self.set_chat_model(m)),
            SettingField::SpeechModel => value.parse::<SpeechModel>().map(|m| self.set_speech_model(m)),
        };
        if let Err(e) = &result {
            warn!("Rejected setting update: {}", e);
        }
        result
    }
}
