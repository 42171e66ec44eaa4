//! Peak amplitude normalization
//!
//! Scales a WAV so its largest absolute sample sits at `target_peak` of full
//! scale. Multi-channel input is reduced to channel 0 first. Output keeps the
//! input sample rate, bit width and sample format.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Normalization errors
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Peak outside (0, 1]
    #[error("Target peak {0} is outside (0, 1]")]
    InvalidPeak(f32),

    /// Every sample is zero; there is nothing to scale
    #[error("Silent audio cannot be normalized: {0}")]
    Silent(PathBuf),

    /// WAV read or write failed
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Output directory creation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reject peaks outside (0, 1]
pub fn validate_peak(target_peak: f32) -> Result<(), NormalizeError> {
    if target_peak > 0.0 && target_peak <= 1.0 {
        Ok(())
    } else {
        Err(NormalizeError::InvalidPeak(target_peak))
    }
}

/// Amplitude normalization capability used by the sampler
pub trait Normalizer: Send + Sync {
    /// Write a normalized copy of `src` to `dst`
    fn normalize(&self, src: &Path, dst: &Path, target_peak: f32) -> Result<(), NormalizeError>;
}

/// `hound`-based peak normalizer
#[derive(Debug, Clone, Copy, Default)]
pub struct PeakNormalizer;

impl Normalizer for PeakNormalizer {
    fn normalize(&self, src: &Path, dst: &Path, target_peak: f32) -> Result<(), NormalizeError> {
        validate_peak(target_peak)?;

        let mut reader = WavReader::open(src)?;
        let spec = reader.spec();
        let channels = usize::from(spec.channels.max(1));

        if spec.channels > 1 {
            tracing::debug!(file = %src.display(), channels = spec.channels, "Using channel 0");
        }

        let out_spec = WavSpec {
            channels: 1,
            ..spec
        };

        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match spec.sample_format {
            SampleFormat::Float => {
                let samples: Vec<f32> = reader
                    .samples::<f32>()
                    .step_by(channels)
                    .collect::<Result<_, _>>()?;
                let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
                if peak == 0.0 {
                    return Err(NormalizeError::Silent(src.to_path_buf()));
                }

                let gain = target_peak / peak;
                let mut writer = WavWriter::create(dst, out_spec)?;
                for s in samples {
                    writer.write_sample(s * gain)?;
                }
                writer.finalize()?;
            }
            SampleFormat::Int => {
                let samples: Vec<i32> = reader
                    .samples::<i32>()
                    .step_by(channels)
                    .collect::<Result<_, _>>()?;
                let peak = samples.iter().map(|s| i64::from(*s).abs()).max().unwrap_or(0);
                if peak == 0 {
                    return Err(NormalizeError::Silent(src.to_path_buf()));
                }

                let max = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f64;
                let min = -max - 1.0;
                let gain = f64::from(target_peak) * max / peak as f64;
                let mut writer = WavWriter::create(dst, out_spec)?;
                for s in samples {
                    let scaled = (f64::from(s) * gain).round().clamp(min, max);
                    writer.write_sample(scaled as i32)?;
                }
                writer.finalize()?;
            }
        }

        tracing::debug!(
            src = %src.display(),
            dst = %dst.display(),
            target_peak,
            "Normalized"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_i16(path: &Path, channels: u16, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for s in samples {
            writer.write_sample(*s).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn read_i16(path: &Path) -> (WavSpec, Vec<i16>) {
        let mut reader = WavReader::open(path).unwrap();
        let spec = reader.spec();
        let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        (spec, samples)
    }

    #[test]
    fn test_scales_peak_to_full_scale() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("in.wav");
        let dst = temp_dir.path().join("out/in.wav");
        write_i16(&src, 1, &[0, 1000, -2000, 500]);

        PeakNormalizer.normalize(&src, &dst, 1.0).unwrap();

        let (spec, samples) = read_i16(&dst);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(samples[2], -32767);
        assert!((i32::from(samples[1]) - 16384).abs() <= 1);
        assert_eq!(samples[0], 0);
    }

    #[test]
    fn test_half_peak_and_channel_zero() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("stereo.wav");
        let dst = temp_dir.path().join("mono.wav");
        // Interleaved L/R; right channel is louder but ignored
        write_i16(&src, 2, &[100, 30000, -200, -30000]);

        PeakNormalizer.normalize(&src, &dst, 0.5).unwrap();

        let (spec, samples) = read_i16(&dst);
        assert_eq!(spec.channels, 1);
        assert_eq!(samples.len(), 2);
        assert!((i32::from(samples[1]) + 16384).abs() <= 1);
        assert_eq!(samples[0], 8192);
    }

    #[test]
    fn test_silent_input() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("silence.wav");
        write_i16(&src, 1, &[0, 0, 0]);

        let result = PeakNormalizer.normalize(&src, &temp_dir.path().join("o.wav"), 1.0);
        assert!(matches!(result, Err(NormalizeError::Silent(_))));
    }

    #[test]
    fn test_peak_range() {
        assert!(validate_peak(1.0).is_ok());
        assert!(validate_peak(0.01).is_ok());
        assert!(matches!(validate_peak(0.0), Err(NormalizeError::InvalidPeak(_))));
        assert!(validate_peak(1.5).is_err());
        assert!(validate_peak(f32::NAN).is_err());
    }
}
