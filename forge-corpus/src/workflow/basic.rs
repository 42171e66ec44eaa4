//! Basic per-file operations
//!
//! Each operation runs over every matching file under the input path; outputs
//! mirror the input layout under the output root.

use crate::models::{BasicReport, FailureStage, FileFailure};
use crate::services::amplitude_normalizer::{validate_peak, Normalizer, PeakNormalizer};
use crate::services::file_scanner::FileScanner;
use crate::services::format_converter::{self, wav_output_path, PcmParams};
use crate::services::wav_header::HeaderDecoder;
use crate::workflow::mirror_path;
use anyhow::Context;
use clap::ValueEnum;
use forge_common::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Operation selected with `basic -f`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BasicOperation {
    /// Log the decoded WAV header
    Info,
    /// Sum WAV durations
    Duration,
    /// Log file sizes in KiB
    Size,
    /// Peak-normalize WAV files
    Norm,
    /// Extract one channel into a mono WAV
    Mono,
    /// Decode MP3 into 16-bit WAV
    Mp3ToWav,
    /// Wrap raw PCM in a WAV header
    PcmToWav,
    /// Re-wrap a WAV payload with a fresh header
    RepairHeader,
}

impl BasicOperation {
    pub fn name(&self) -> &'static str {
        match self {
            BasicOperation::Info => "info",
            BasicOperation::Duration => "duration",
            BasicOperation::Size => "size",
            BasicOperation::Norm => "norm",
            BasicOperation::Mono => "mono",
            BasicOperation::Mp3ToWav => "mp3-to-wav",
            BasicOperation::PcmToWav => "pcm-to-wav",
            BasicOperation::RepairHeader => "repair-header",
        }
    }

    /// Input file pattern
    fn pattern(&self) -> Result<Regex> {
        let pattern = match self {
            BasicOperation::Size => ".",
            BasicOperation::Mp3ToWav => r"\.mp3$",
            BasicOperation::PcmToWav => r"\.pcm$",
            _ => r"\.wav$",
        };
        FileScanner::pattern(pattern).map_err(|e| Error::Internal(e.to_string()))
    }

    fn writes_output(&self) -> bool {
        matches!(
            self,
            BasicOperation::Norm
                | BasicOperation::Mono
                | BasicOperation::Mp3ToWav
                | BasicOperation::PcmToWav
                | BasicOperation::RepairHeader
        )
    }
}

/// Settings for a basic run
#[derive(Debug, Clone)]
pub struct BasicOptions {
    pub input: PathBuf,
    pub output_root: PathBuf,
    /// `norm` target peak, in (0, 1]
    pub peak: f32,
    /// `mono` channel index
    pub channel: u16,
    /// `pcm-to-wav` and `repair-header` parameters
    pub pcm: PcmParams,
}

/// Run `operation` over every matching file
///
/// Invalid operation parameters are rejected before any file is touched.
pub fn run_basic(operation: BasicOperation, options: &BasicOptions) -> Result<BasicReport> {
    match operation {
        BasicOperation::Norm => {
            validate_peak(options.peak).map_err(|e| Error::InvalidInput(e.to_string()))?
        }
        BasicOperation::PcmToWav | BasicOperation::RepairHeader => options
            .pcm
            .validate()
            .map_err(|e| Error::InvalidInput(e.to_string()))?,
        _ => {}
    }

    let files = FileScanner::new().list_files(&options.input, &operation.pattern()?);
    let mut report = BasicReport {
        operation: operation.name().to_string(),
        total_files: files.len(),
        processed: 0,
        total_duration_seconds: 0.0,
        failures: Vec::new(),
    };

    if operation.writes_output() {
        tracing::info!(
            operation = operation.name(),
            output = %options.output_root.display(),
            files = files.len(),
            "Processing"
        );
    }

    let decoder = HeaderDecoder::new();
    for file in &files {
        let dst = mirror_path(&options.input, file, &options.output_root);
        match apply(operation, &decoder, file, &dst, options) {
            Ok(duration) => {
                report.processed += 1;
                report.total_duration_seconds += duration;
            }
            Err(e) => {
                tracing::error!(file = %file.display(), operation = operation.name(), "{:#}", e);
                report
                    .failures
                    .push(FileFailure::new(file, FailureStage::Process, format!("{:#}", e)));
            }
        }
    }

    if operation == BasicOperation::Duration {
        tracing::info!(
            files = report.processed,
            total_seconds = report.total_duration_seconds,
            "Total duration {:.2} h",
            report.total_duration_seconds / 3600.0
        );
    }

    Ok(report)
}

/// One file; returns the duration contributed to the total
fn apply(
    operation: BasicOperation,
    decoder: &HeaderDecoder,
    file: &Path,
    dst: &Path,
    options: &BasicOptions,
) -> anyhow::Result<f64> {
    match operation {
        BasicOperation::Info => {
            let header = decoder.decode(file)?;
            tracing::info!(
                file = %file.display(),
                channels = header.channels,
                sample_rate = header.sample_rate,
                bits = header.bits_per_sample,
                byte_rate = header.byte_rate,
                block_align = header.block_align,
                audio_format = header.audio_format,
                duration_s = header.duration_seconds,
                frames = header.frame_count,
                "WAV header"
            );
        }
        BasicOperation::Duration => {
            let header = decoder.decode(file)?;
            tracing::debug!(file = %file.display(), duration_s = header.duration_seconds, "Duration");
            return Ok(header.duration_seconds);
        }
        BasicOperation::Size => {
            let kib = format_converter::file_size_kib(file)
                .with_context(|| format!("Failed to stat {}", file.display()))?;
            if kib == 0.0 {
                tracing::error!(file = %file.display(), "Size {} KiB", kib);
            } else {
                tracing::info!(file = %file.display(), "Size {} KiB", kib);
            }
        }
        BasicOperation::Norm => {
            PeakNormalizer.normalize(file, dst, options.peak)?;
        }
        BasicOperation::Mono => {
            format_converter::extract_channel(file, dst, options.channel)?;
        }
        BasicOperation::Mp3ToWav => {
            format_converter::mp3_to_wav(file, dst)?;
        }
        BasicOperation::PcmToWav => {
            format_converter::pcm_to_wav(file, &wav_output_path(dst), &options.pcm)?;
        }
        BasicOperation::RepairHeader => {
            format_converter::repair_header(file, dst, &options.pcm)?;
        }
    }
    Ok(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::wav_header::build_pcm_header;
    use tempfile::TempDir;

    fn options(input: &Path, output_root: &Path) -> BasicOptions {
        BasicOptions {
            input: input.to_path_buf(),
            output_root: output_root.to_path_buf(),
            peak: 1.0,
            channel: 0,
            pcm: PcmParams::default(),
        }
    }

    fn write_wav(path: &Path, payload: usize) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut bytes = build_pcm_header(1, 16_000, 16, payload as u32).to_vec();
        bytes.extend(std::iter::repeat(0u8).take(payload));
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_duration_sums_and_records_failures() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in");
        write_wav(&input.join("a.wav"), 32_000);
        write_wav(&input.join("sub/b.wav"), 16_000);
        std::fs::write(input.join("broken.wav"), b"RIFF").unwrap();

        let report = run_basic(
            BasicOperation::Duration,
            &options(&input, &temp_dir.path().join("out")),
        )
        .unwrap();

        assert_eq!(report.total_files, 3);
        assert_eq!(report.processed, 2);
        assert_eq!(report.failures.len(), 1);
        assert!((report.total_duration_seconds - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_pcm_to_wav_mirrors_layout() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in");
        std::fs::create_dir_all(input.join("x")).unwrap();
        std::fs::write(input.join("x/raw.pcm"), vec![0u8; 320]).unwrap();
        let out = temp_dir.path().join("out");

        let report = run_basic(BasicOperation::PcmToWav, &options(&input, &out)).unwrap();

        assert_eq!(report.processed, 1);
        assert!(out.join("x/raw.wav").is_file());
    }

    #[test]
    fn test_invalid_parameters_rejected_up_front() {
        let temp_dir = TempDir::new().unwrap();
        let mut opts = options(temp_dir.path(), temp_dir.path());
        opts.peak = 2.0;
        assert!(matches!(
            run_basic(BasicOperation::Norm, &opts),
            Err(Error::InvalidInput(_))
        ));

        let mut opts = options(temp_dir.path(), temp_dir.path());
        opts.pcm.bits_per_sample = 12;
        assert!(matches!(
            run_basic(BasicOperation::RepairHeader, &opts),
            Err(Error::InvalidInput(_))
        ));
    }
}
