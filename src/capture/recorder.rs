use super::resampler::downmix_to_mono;
use crate::{MurmurError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// True when the host exposes a default input device
pub fn input_device_available() -> bool {
    cpal::default_host().default_input_device().is_some()
}

/// A running microphone capture.
///
/// `cpal::Stream` cannot move between threads, so the stream lives on its
/// own thread and is dropped there when [`MicrophoneRecorder::stop`] is called.
pub struct MicrophoneRecorder {
    stop_tx: Sender<()>,
    worker: JoinHandle<()>,
    samples: Arc<Mutex<Vec<f32>>>,
    device_rate: u32,
}

impl MicrophoneRecorder {
    /// Open the default input device and start collecting mono samples
    pub fn start() -> Result<Self> {
        let (ready_tx, ready_rx) = bounded::<Result<u32>>(1);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let samples = Arc::new(Mutex::new(Vec::with_capacity(48000 * 30)));
        let sink = Arc::clone(&samples);

        let worker = thread::spawn(move || {
            let stream = match open_stream(sink) {
                Ok((stream, rate)) => {
                    let _ = ready_tx.send(Ok(rate));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            // Park until stop() or until the recorder is dropped
            let _ = stop_rx.recv();
            drop(stream);
            debug!("Input stream closed");
        });

        let device_rate = ready_rx
            .recv()
            .map_err(|e| MurmurError::Channel(format!("Recorder thread exited: {}", e)))??;

        info!("Started audio recording at {} Hz", device_rate);
        Ok(Self {
            stop_tx,
            worker,
            samples,
            device_rate,
        })
    }

    /// Stop the stream and return the captured mono samples with their rate
    pub fn stop(self) -> Result<(Vec<f32>, u32)> {
        let _ = self.stop_tx.send(());
        self.worker
            .join()
            .map_err(|_| MurmurError::Capture("Recorder thread panicked".into()))?;

        let samples = std::mem::take(&mut *self.samples.lock());
        info!(
            "Stopped audio recording, {} samples ({:.2}s)",
            samples.len(),
            samples.len() as f32 / self.device_rate as f32
        );
        Ok((samples, self.device_rate))
    }
}

fn open_stream(sink: Arc<Mutex<Vec<f32>>>) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| MurmurError::Capture("No input device available".into()))?;

    info!(
        "Using input device: {}",
        device.name().unwrap_or_else(|_| "Unknown".to_string())
    );

    let config: cpal::StreamConfig = device
        .default_input_config()
        .map_err(|e| MurmurError::Capture(format!("Failed to get input config: {}", e)))?
        .into();

    let channels = config.channels as usize;
    let rate = config.sample_rate.0;

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mono = downmix_to_mono(data, channels);
                sink.lock().extend_from_slice(&mono);
            },
            |err| error!("Audio input stream error: {}", err),
            None,
        )
        .map_err(|e| MurmurError::Capture(format!("Failed to build input stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| MurmurError::Capture(format!("Failed to start input stream: {}", e)))?;

    Ok((stream, rate))
}
