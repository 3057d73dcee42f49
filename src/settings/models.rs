use crate::{MurmurError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chat model tiers offered by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChatModel {
    #[default]
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[serde(rename = "gpt-4")]
    Gpt4,
}

impl ChatModel {
    pub const ALL: [ChatModel; 2] = [ChatModel::Gpt35Turbo, ChatModel::Gpt4];

    /// Identifier sent to the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatModel::Gpt35Turbo => "gpt-3.5-turbo",
            ChatModel::Gpt4 => "gpt-4",
        }
    }

    /// Display name for pickers
    pub fn label(&self) -> &'static str {
        match self {
            ChatModel::Gpt35Turbo => "GPT-3.5 Turbo",
            ChatModel::Gpt4 => "GPT-4",
        }
    }
}

impl FromStr for ChatModel {
    type Err = MurmurError;

    fn from_str(s: &str) -> Result<Self> {
        ChatModel::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| invalid(SettingField::ChatModel, s))
    }
}

impl fmt::Display for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speech-recognition model sizes offered by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechModel {
    Tiny,
    #[default]
    Base,
    Small,
    Medium,
    Large,
}

impl SpeechModel {
    pub const ALL: [SpeechModel; 5] = [
        SpeechModel::Tiny,
        SpeechModel::Base,
        SpeechModel::Small,
        SpeechModel::Medium,
        SpeechModel::Large,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpeechModel::Tiny => "tiny",
            SpeechModel::Base => "base",
            SpeechModel::Small => "small",
            SpeechModel::Medium => "medium",
            SpeechModel::Large => "large",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpeechModel::Tiny => "Tiny (fastest)",
            SpeechModel::Base => "Base",
            SpeechModel::Small => "Small",
            SpeechModel::Medium => "Medium",
            SpeechModel::Large => "Large (most accurate)",
        }
    }
}

impl FromStr for SpeechModel {
    type Err = MurmurError;

    fn from_str(s: &str) -> Result<Self> {
        SpeechModel::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| invalid(SettingField::SpeechModel, s))
    }
}

impl fmt::Display for SpeechModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which setting an untyped update targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    ChatModel,
    SpeechModel,
}

impl SettingField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingField::ChatModel => "chat_model",
            SettingField::SpeechModel => "speech_model",
        }
    }
}

impl FromStr for SettingField {
    type Err = MurmurError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chat" | "chat_model" => Ok(SettingField::ChatModel),
            "speech" | "speech_model" => Ok(SettingField::SpeechModel),
            other => Err(MurmurError::InvalidSetting {
                field: "setting".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SettingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn invalid(field: SettingField, value: &str) -> MurmurError {
    MurmurError::InvalidSetting {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Current model selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chat_model: ChatModel,
    pub speech_model: SpeechModel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.chat_model, ChatModel::Gpt35Turbo);
        assert_eq!(settings.speech_model, SpeechModel::Base);
    }

    #[test]
    fn test_parse_closed_sets() {
        assert_eq!("gpt-4".parse::<ChatModel>().unwrap(), ChatModel::Gpt4);
        assert_eq!("large".parse::<SpeechModel>().unwrap(), SpeechModel::Large);
        assert!("gpt-5".parse::<ChatModel>().is_err());
        assert!("huge".parse::<SpeechModel>().is_err());
        assert!("GPT-4".parse::<ChatModel>().is_err());
    }

    #[test]
    fn test_serde_uses_backend_identifiers() {
        let settings = Settings {
            chat_model: ChatModel::Gpt4,
            speech_model: SpeechModel::Small,
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(json, r#"{"chat_model":"gpt-4","speech_model":"small"}"#);

        let parsed: Settings = serde_json::from_str(r#"{"speech_model":"tiny"}"#).unwrap();
        assert_eq!(parsed.chat_model, ChatModel::Gpt35Turbo);
        assert_eq!(parsed.speech_model, SpeechModel::Tiny);
    }

    #[test]
    fn test_field_aliases() {
        assert_eq!("chat".parse::<SettingField>().unwrap(), SettingField::ChatModel);
        assert_eq!(
            "speech_model".parse::<SettingField>().unwrap(),
            SettingField::SpeechModel
        );
        assert!("volume".parse::<SettingField>().is_err());
    }
}
