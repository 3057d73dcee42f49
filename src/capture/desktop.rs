use super::wav::write_wav;
use super::{AudioFormat, ImageSource, MediaCapture};
use crate::{MurmurError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[cfg(feature = "audio-io")]
use super::recorder::{input_device_available, MicrophoneRecorder};
#[cfg(feature = "audio-io")]
use super::resampler::resample_mono;

/// Media capture for desktop hosts.
///
/// Records from the default microphone (with the `audio-io` feature) and
/// takes gallery images from a path staged by the front end. There is no
/// camera, so camera permission is never granted.
pub struct DesktopCapture {
    recordings_dir: PathBuf,
    active: Mutex<Option<ActiveRecording>>,
    gallery_selection: Mutex<Option<PathBuf>>,
}

struct ActiveRecording {
    format: AudioFormat,
    #[cfg(feature = "audio-io")]
    recorder: MicrophoneRecorder,
}

impl DesktopCapture {
    pub fn new(recordings_dir: impl Into<PathBuf>) -> Self {
        Self {
            recordings_dir: recordings_dir.into(),
            active: Mutex::new(None),
            gallery_selection: Mutex::new(None),
        }
    }

    /// Choose the file the next gallery pick returns
    pub fn stage_gallery_selection(&self, path: impl Into<PathBuf>) {
        *self.gallery_selection.lock() = Some(path.into());
    }

    pub fn is_recording(&self) -> bool {
        self.active.lock().is_some()
    }

    fn next_recording_path(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.recordings_dir)?;
        Ok(self
            .recordings_dir
            .join(format!("recording-{}.wav", Uuid::new_v4())))
    }

    #[cfg(feature = "audio-io")]
    fn open_recording(format: AudioFormat) -> Result<ActiveRecording> {
        let recorder = MicrophoneRecorder::start()?;
        Ok(ActiveRecording { format, recorder })
    }

    #[cfg(not(feature = "audio-io"))]
    fn open_recording(_format: AudioFormat) -> Result<ActiveRecording> {
        Err(MurmurError::Capture(
            "Built without microphone support (audio-io feature)".into(),
        ))
    }

    #[cfg(feature = "audio-io")]
    fn finish_recording(recording: ActiveRecording) -> Result<(Vec<f32>, AudioFormat)> {
        let (samples, device_rate) = recording.recorder.stop()?;
        let samples = resample_mono(&samples, device_rate, recording.format.sample_rate)?;
        Ok((samples, recording.format))
    }

    #[cfg(not(feature = "audio-io"))]
    fn finish_recording(recording: ActiveRecording) -> Result<(Vec<f32>, AudioFormat)> {
        Ok((Vec::new(), recording.format))
    }
}

#[async_trait]
impl MediaCapture for DesktopCapture {
    async fn request_audio_permission(&self) -> bool {
        #[cfg(feature = "audio-io")]
        {
            input_device_available()
        }
        #[cfg(not(feature = "audio-io"))]
        {
            false
        }
    }

    async fn request_camera_permission(&self) -> bool {
        debug!("No camera on desktop");
        false
    }

    async fn start_audio_capture(&self, format: AudioFormat) -> Result<()> {
        let mut active = self.active.lock();
        if active.is_some() {
            warn!("Already recording");
            return Ok(());
        }
        *active = Some(Self::open_recording(format)?);
        Ok(())
    }

    async fn stop_audio_capture(&self) -> Result<PathBuf> {
        let recording = self
            .active
            .lock()
            .take()
            .ok_or_else(|| MurmurError::Capture("No recording in progress".into()))?;

        let (samples, format) = Self::finish_recording(recording)?;
        let path = self.next_recording_path()?;
        write_wav(&path, &samples, format)?;
        info!("Recording saved: {}", path.display());
        Ok(path)
    }

    async fn pick_image(&self, source: ImageSource) -> Result<Option<String>> {
        match source {
            ImageSource::Camera => Err(MurmurError::Capture("No camera available".into())),
            ImageSource::Gallery => {
                let Some(path) = self.gallery_selection.lock().take() else {
                    debug!("Gallery pick cancelled: nothing selected");
                    return Ok(None);
                };
                if !path.is_file() {
                    warn!("Gallery selection {} does not exist", path.display());
                    return Ok(None);
                }
                let path = path.canonicalize()?;
                Ok(Some(format!("file://{}", path.display())))
            }
        }
    }
}
