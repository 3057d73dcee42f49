//! Application configuration
//!
//! Loaded from `config.toml` in the platform config directory. Every field
//! has a default, so a partial (or missing) file is fine.

use crate::capture::AudioFormat;
use crate::settings::Settings;
use crate::{MurmurError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable overriding the backend base URL
pub const BACKEND_URL_ENV: &str = "MURMUR_BACKEND_URL";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Remote backend endpoints
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Chat endpoint (text and/or image in, reply out)
    pub chat_url: String,

    /// Transcription endpoint (audio in, transcript out)
    pub transcribe_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::from_base_url(DEFAULT_BASE_URL)
    }
}

impl BackendConfig {
    /// Derive both endpoints from a server base URL
    pub fn from_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            chat_url: format!("{}/api/chat", base),
            transcribe_url: format!("{}/api/transcribe", base),
            timeout_secs: 60,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Microphone recording configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,

    /// Where finished recordings are written
    pub recordings_dir: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        let format = AudioFormat::default();
        Self {
            sample_rate: format.sample_rate,
            channels: format.channels,
            bits_per_sample: format.bits_per_sample,
            recordings_dir: std::env::temp_dir().join("murmur"),
        }
    }
}

impl AudioConfig {
    pub fn format(&self) -> AudioFormat {
        AudioFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: self.bits_per_sample,
        }
    }
}

/// Spoken reply output
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// External text-to-speech program (e.g. `espeak`); replies are only
    /// logged when unset
    pub command: Option<String>,

    /// Extra arguments placed before the spoken text
    pub args: Vec<String>,
}

/// Configuration for the complete client
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub audio: AudioConfig,
    pub speech: SpeechConfig,

    /// Model selection at startup
    pub settings: Settings,
}

impl AppConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("murmur").join("config.toml"))
    }

    /// Parse a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| MurmurError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| MurmurError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `path`, or the default location, falling back to defaults
    /// when no file exists there. The environment override is applied last.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };

        let mut config = match path {
            Some(p) if p.exists() => Self::load(&p)?,
            Some(p) => {
                debug!("No config at {}, using defaults", p.display());
                Self::default()
            }
            None => Self::default(),
        };

        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            debug!("Backend URL overridden by {}", BACKEND_URL_ENV);
            config = config.with_backend_url(&url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| MurmurError::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Point both endpoints at a new server, keeping the timeout
    pub fn with_backend_url(mut self, base: &str) -> Self {
        let timeout_secs = self.backend.timeout_secs;
        self.backend = BackendConfig::from_base_url(base);
        self.backend.timeout_secs = timeout_secs;
        self
    }

    /// Only log replies instead of speaking them
    pub fn without_speech_command(mut self) -> Self {
        self.speech.command = None;
        self
    }

    pub fn with_recordings_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audio.recordings_dir = dir.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("chat_url", &self.backend.chat_url),
            ("transcribe_url", &self.backend.transcribe_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(MurmurError::Config(format!(
                    "backend.{} must be an http(s) URL, got {:?}",
                    name, url
                )));
            }
        }

        if self.backend.timeout_secs == 0 {
            return Err(MurmurError::Config("backend.timeout_secs must be > 0".into()));
        }

        if self.audio.sample_rate == 0 {
            return Err(MurmurError::Config("audio.sample_rate must be > 0".into()));
        }

        if self.audio.channels == 0 {
            return Err(MurmurError::Config("audio.channels must be > 0".into()));
        }

        if self.audio.bits_per_sample != 16 {
            return Err(MurmurError::Config(format!(
                "audio.bits_per_sample must be 16, got {}",
                self.audio.bits_per_sample
            )));
        }

        if matches!(&self.speech.command, Some(cmd) if cmd.trim().is_empty()) {
            return Err(MurmurError::Config("speech.command must not be blank".into()));
        }

        Ok(())
    }
}
