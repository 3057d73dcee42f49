use crate::{MurmurError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

const CHUNK_SIZE: usize = 1024;

/// Average interleaved frames down to a single channel
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Resample a mono signal from `input_rate` to `output_rate`
pub fn resample_mono(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == 0 || output_rate == 0 {
        return Err(MurmurError::Audio("Sample rates must be greater than 0".into()));
    }
    if input_rate == output_rate || input.is_empty() {
        return Ok(input.to_vec());
    }

    let ratio = output_rate as f64 / input_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK_SIZE, 1)
        .map_err(|e| MurmurError::Audio(format!("Failed to create resampler: {}", e)))?;

    let mut output = Vec::with_capacity((input.len() as f64 * ratio * 1.1) as usize);

    // SincFixedIn wants exactly CHUNK_SIZE frames per call; the tail is zero padded
    for chunk in input.chunks(CHUNK_SIZE) {
        let mut frame = vec![0.0f32; CHUNK_SIZE];
        frame[..chunk.len()].copy_from_slice(chunk);

        let processed = resampler
            .process(&[frame], None)
            .map_err(|e| MurmurError::Audio(format!("Resampling failed: {}", e)))?;

        let produced = &processed[0];
        let take = if chunk.len() < CHUNK_SIZE {
            ((chunk.len() as f64) * ratio).ceil() as usize
        } else {
            produced.len()
        };
        output.extend_from_slice(&produced[..take.min(produced.len())]);
    }

    debug!(
        "Resampled {} samples ({} Hz) -> {} samples ({} Hz)",
        input.len(),
        input_rate,
        output.len(),
        output_rate
    );
    Ok(output)
}
