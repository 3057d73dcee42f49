//! Remote transcription and chat backend

pub mod http;

pub use http::HttpBackend;

use crate::messages::ImageRef;
use crate::settings::{ChatModel, SpeechModel};
use crate::Result;
use async_trait::async_trait;
use std::path::Path;

/// Reply text used when the backend answers without a `response`
pub const EMPTY_REPLY: &str = "(No response)";

/// One chat call: the selected model plus an optional text and/or image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub model: ChatModel,
    pub message: Option<String>,
    pub image: Option<ImageRef>,
}

impl ChatRequest {
    pub fn text(model: ChatModel, message: impl Into<String>) -> Self {
        Self {
            model,
            message: Some(message.into()),
            image: None,
        }
    }

    pub fn image(model: ChatModel, image: ImageRef, message: Option<String>) -> Self {
        Self {
            model,
            message,
            image: Some(image),
        }
    }

    /// The message text trimmed, or `None` when absent or blank
    pub fn trimmed_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// The two remote calls the session depends on
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Convert a recorded audio file to text
    async fn transcribe(&self, audio: &Path, model: SpeechModel) -> Result<String>;

    /// Ask the language model for a reply
    async fn chat(&self, request: &ChatRequest) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trimmed_message() {
        let request = ChatRequest::text(ChatModel::Gpt4, "  hi  ");
        assert_eq!(request.trimmed_message(), Some("hi"));

        let request = ChatRequest::image(ChatModel::Gpt4, ImageRef::new("/a.jpg"), Some("   ".into()));
        assert_eq!(request.trimmed_message(), None);

        let request = ChatRequest::image(ChatModel::Gpt4, ImageRef::new("/a.jpg"), None);
        assert_eq!(request.trimmed_message(), None);
    }
}
