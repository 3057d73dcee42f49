pub mod backend;
pub mod capture;
pub mod config;
pub mod messages;
pub mod session;
pub mod settings;
pub mod speech;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum MurmurError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Invalid value {value:?} for setting {field}")]
    InvalidSetting { field: String, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Audio processing error: {0}")]
    Audio(String),
}

impl From<std::io::Error> for MurmurError {
    fn from(e: std::io::Error) -> Self {
        MurmurError::Io(e.to_string())
    }
}

impl MurmurError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The user has to change the permission outside the app
            MurmurError::PermissionDenied(_) => false,
            // Network failures are transient; the user re-issues the action
            MurmurError::Transcription(_) => true,
            MurmurError::Chat(_) => true,
            MurmurError::Capture(_) => true,
            MurmurError::InvalidSetting { .. } => true,
            MurmurError::Config(_) => false,
            MurmurError::Io(_) => false,
            MurmurError::Channel(_) => false,
            MurmurError::Audio(_) => true,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            MurmurError::PermissionDenied(what) => format!("{} permission denied.", what),
            MurmurError::Transcription(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            MurmurError::Chat(_) => "Failed to send message to backend.".to_string(),
            MurmurError::Capture(_) => {
                "Media capture failed. Please check your microphone or camera.".to_string()
            }
            MurmurError::InvalidSetting { field, value } => {
                format!("'{}' is not a valid choice for {}.", value, field)
            }
            MurmurError::Config(_) => "Configuration error. Please check settings.".to_string(),
            MurmurError::Io(_) => "File system error occurred.".to_string(),
            MurmurError::Channel(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            MurmurError::Audio(_) => "Audio processing failed. Please try again.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MurmurError>;
