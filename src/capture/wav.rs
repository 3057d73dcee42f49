use super::AudioFormat;
use crate::{MurmurError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use tracing::{debug, info};

/// Write mono samples (f32, -1.0..=1.0) as 16-bit PCM in the given format.
///
/// When the format asks for more than one channel the mono signal is copied
/// into every channel.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], format: AudioFormat) -> Result<()> {
    if format.bits_per_sample != 16 {
        return Err(MurmurError::Audio(format!(
            "Unsupported bit depth: {}",
            format.bits_per_sample
        )));
    }

    let spec = WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path.as_ref(), spec)
        .map_err(|e| MurmurError::Io(format!("Failed to create WAV writer: {}", e)))?;

    for &sample in samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        for _ in 0..format.channels {
            writer
                .write_sample(sample_i16)
                .map_err(|e| MurmurError::Io(format!("Failed to write sample: {}", e)))?;
        }
    }

    writer
        .finalize()
        .map_err(|e| MurmurError::Io(format!("Failed to finalize WAV file: {}", e)))?;

    info!("Wrote {} samples to WAV file: {:?}", samples.len(), path.as_ref());
    Ok(())
}

/// Read a 16-bit PCM WAV file.
///
/// Returns the interleaved samples and the format they were stored in.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, AudioFormat)> {
    let mut reader = WavReader::open(path.as_ref())
        .map_err(|e| MurmurError::Io(format!("Failed to open WAV file: {}", e)))?;

    let spec = reader.spec();
    debug!(
        "Reading WAV file: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );

    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(MurmurError::Audio(format!(
            "Unsupported WAV encoding: {:?} {} bits",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let samples = reader
        .samples::<i16>()
        .map(|s| {
            s.map(|sample| sample as f32 / i16::MAX as f32)
                .map_err(|e| MurmurError::Io(format!("Failed to read sample: {}", e)))
        })
        .collect::<Result<Vec<f32>>>()?;

    let format = AudioFormat {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
    };
    Ok((samples, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_write_read_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let samples: Vec<f32> = (0..16000)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / 16000.0).sin() * 0.5)
            .collect();

        write_wav(&path, &samples, AudioFormat::default()).unwrap();

        let (read_samples, format) = read_wav(&path).unwrap();
        assert_eq!(format, AudioFormat::default());
        assert_eq!(read_samples.len(), samples.len());
        for (original, read) in samples.iter().zip(read_samples.iter()) {
            assert!((original - read).abs() < 0.001);
        }
    }

    #[test]
    fn test_mono_fills_every_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let format = AudioFormat {
            channels: 2,
            ..AudioFormat::default()
        };

        write_wav(&path, &[0.5, -0.5], format).unwrap();
        let (samples, read_format) = read_wav(&path).unwrap();
        assert_eq!(read_format.channels, 2);
        assert_eq!(samples.len(), 4);
        assert!((samples[0] - samples[1]).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rejects_other_bit_depths() {
        let dir = tempfile::tempdir().unwrap();
        let format = AudioFormat {
            bits_per_sample: 24,
            ..AudioFormat::default()
        };
        assert!(write_wav(dir.path().join("x.wav"), &[0.0], format).is_err());
    }
}
