//! Media capture: microphone recordings and image acquisition
//!
//! The session controller only sees the [`MediaCapture`] trait. Mobile
//! shells implement it over the platform pickers; [`DesktopCapture`] is the
//! implementation used by the bundled binary.

pub mod desktop;
#[cfg(feature = "audio-io")]
pub mod recorder;
pub mod resampler;
pub mod wav;

pub use desktop::DesktopCapture;
#[cfg(feature = "audio-io")]
pub use recorder::MicrophoneRecorder;
pub use resampler::{downmix_to_mono, resample_mono};
pub use wav::{read_wav, write_wav};

use crate::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

/// PCM format requested for recordings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            bits_per_sample: 16,
        }
    }
}

/// Where an image comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Camera,
    Gallery,
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Camera => f.write_str("camera"),
            ImageSource::Gallery => f.write_str("gallery"),
        }
    }
}

/// Microphone and image acquisition used by the session controller
#[async_trait]
pub trait MediaCapture: Send + Sync {
    /// Ask for microphone access; `true` when granted
    async fn request_audio_permission(&self) -> bool;

    /// Ask for camera access; `true` when granted
    async fn request_camera_permission(&self) -> bool;

    /// Begin recording in the given format
    async fn start_audio_capture(&self, format: AudioFormat) -> Result<()>;

    /// Finish the current recording and return the audio file it produced
    async fn stop_audio_capture(&self) -> Result<PathBuf>;

    /// Acquire one image. `Ok(None)` means the user cancelled.
    async fn pick_image(&self, source: ImageSource) -> Result<Option<String>>;
}
