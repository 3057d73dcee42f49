use super::{BackendClient, ChatRequest, EMPTY_REPLY};
use crate::config::BackendConfig;
use crate::settings::SpeechModel;
use crate::{MurmurError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    transcript: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    response: Option<String>,
}

/// [`BackendClient`] speaking multipart HTTP to the configured endpoints
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    chat_url: String,
    transcribe_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| MurmurError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            chat_url: config.chat_url.clone(),
            transcribe_url: config.transcribe_url.clone(),
        })
    }

    /// Upload part for a local file, sent under a fixed `name`
    async fn file_part(
        path: &Path,
        mime: &str,
        name: &'static str,
        err: fn(String) -> MurmurError,
    ) -> Result<Part> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| err(format!("Failed to read {}: {}", path.display(), e)))?;
        Part::bytes(bytes)
            .file_name(name)
            .mime_str(mime)
            .map_err(|e| err(format!("Invalid content type {}: {}", mime, e)))
    }
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn transcribe(&self, audio: &Path, model: SpeechModel) -> Result<String> {
        let started = Instant::now();
        let file = Self::file_part(
            audio,
            "audio/wav",
            "recording.wav",
            MurmurError::Transcription,
        )
        .await?;

        let form = Form::new()
            .text("speech_model", model.as_str())
            .part("file", file);

        debug!("POST {} (speech_model={})", self.transcribe_url, model);
        let response = self
            .http
            .post(&self.transcribe_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MurmurError::Transcription(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MurmurError::Transcription(format!(
                "Backend returned {}",
                status
            )));
        }

        let body: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| MurmurError::Transcription(format!("Invalid response body: {}", e)))?;

        info!(
            "Transcribed {} in {}ms",
            audio.display(),
            started.elapsed().as_millis()
        );
        Ok(body.transcript)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let started = Instant::now();
        let mut form = Form::new().text("model", request.model.as_str());

        if let Some(message) = request.trimmed_message() {
            form = form.text("message", message.to_string());
        }

        if let Some(image) = &request.image {
            let path = image.to_path();
            let file = Self::file_part(&path, "image/jpeg", "photo.jpg", MurmurError::Chat).await?;
            form = form.part("file", file);
        }

        debug!(
            "POST {} (model={}, text={}, image={})",
            self.chat_url,
            request.model,
            request.trimmed_message().is_some(),
            request.image.is_some()
        );
        let response = self
            .http
            .post(&self.chat_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MurmurError::Chat(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MurmurError::Chat(format!("Backend returned {}", status)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| MurmurError::Chat(format!("Invalid response body: {}", e)))?;

        info!("Chat reply received in {}ms", started.elapsed().as_millis());
        Ok(body
            .response
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| EMPTY_REPLY.to_string()))
    }
}
