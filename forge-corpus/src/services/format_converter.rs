//! Container conversion helpers
//!
//! Raw PCM wrapping, header repair, channel extraction and MP3 decoding.
//! Header-level operations stream the payload; nothing but the MP3 decoder
//! holds more than one packet of audio in memory.

use crate::services::wav_header::{build_pcm_header, pcm_rates, HEADER_LEN};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

/// Conversion errors
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Caller-supplied PCM parameters are unusable
    #[error("Invalid PCM parameters: {0}")]
    InvalidParams(String),

    /// Requested channel does not exist
    #[error("Channel {index} out of range ({channels} channels in {path})")]
    ChannelOutOfRange {
        path: PathBuf,
        index: u16,
        channels: u16,
    },

    /// Payload does not fit a 32-bit RIFF size
    #[error("Payload of {0} bytes is too large for a WAV file")]
    TooLarge(u64),

    /// MP3 probing or decoding failed
    #[error("Decode failed for {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Parameters of headerless PCM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmParams {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for PcmParams {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
            bits_per_sample: 16,
        }
    }
}

impl PcmParams {
    /// Bits must be a whole number of bytes, at most 32
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.bits_per_sample == 0 || self.bits_per_sample % 8 != 0 || self.bits_per_sample > 32
        {
            return Err(ConvertError::InvalidParams(format!(
                "bits per sample must be 8, 16, 24 or 32, got {}",
                self.bits_per_sample
            )));
        }
        if self.channels == 0 || self.sample_rate == 0 {
            return Err(ConvertError::InvalidParams(format!(
                "channels ({}) and sample rate ({}) must be non-zero",
                self.channels, self.sample_rate
            )));
        }
        if pcm_rates(self.channels, self.sample_rate, self.bits_per_sample).is_none() {
            return Err(ConvertError::InvalidParams(format!(
                "{} channels at {} Hz and {} bits overflow the WAV header",
                self.channels, self.sample_rate, self.bits_per_sample
            )));
        }
        Ok(())
    }
}

/// `dst` with its extension replaced by `.wav`
pub fn wav_output_path(dst: &Path) -> PathBuf {
    dst.with_extension("wav")
}

/// File size in KiB, rounded to two decimals
pub fn file_size_kib(path: &Path) -> io::Result<f64> {
    let bytes = std::fs::metadata(path)?.len();
    Ok((bytes as f64 / 1024.0 * 100.0).round() / 100.0)
}

fn create_output(dst: &Path) -> io::Result<BufWriter<File>> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(dst)?))
}

/// Header plus the rest of `src` from its current position
fn write_wrapped(
    src: &mut File,
    payload_len: u64,
    dst: &Path,
    params: &PcmParams,
) -> Result<(), ConvertError> {
    let data_len = u32::try_from(payload_len)
        .ok()
        .filter(|len| *len <= u32::MAX - 36)
        .ok_or(ConvertError::TooLarge(payload_len))?;

    let mut out = create_output(dst)?;
    out.write_all(&build_pcm_header(
        params.channels,
        params.sample_rate,
        params.bits_per_sample,
        data_len,
    ))?;
    io::copy(src, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Wrap headerless PCM in a canonical WAV header
pub fn pcm_to_wav(src: &Path, dst: &Path, params: &PcmParams) -> Result<(), ConvertError> {
    params.validate()?;
    let mut input = File::open(src)?;
    let payload_len = input.metadata()?.len();
    write_wrapped(&mut input, payload_len, dst, params)?;

    tracing::debug!(src = %src.display(), dst = %dst.display(), "PCM wrapped");
    Ok(())
}

/// Replace the first 44 bytes of `src` with a fresh header
pub fn repair_header(src: &Path, dst: &Path, params: &PcmParams) -> Result<(), ConvertError> {
    params.validate()?;
    let mut input = File::open(src)?;
    let payload_len = input.metadata()?.len().saturating_sub(HEADER_LEN as u64);
    input.seek(SeekFrom::Start(HEADER_LEN as u64))?;
    write_wrapped(&mut input, payload_len, dst, params)?;

    tracing::debug!(src = %src.display(), dst = %dst.display(), "Header repaired");
    Ok(())
}

/// Write channel `index` of `src` as a mono WAV with the same format
pub fn extract_channel(src: &Path, dst: &Path, index: u16) -> Result<(), ConvertError> {
    let mut reader = WavReader::open(src)?;
    let spec = reader.spec();
    if index >= spec.channels {
        return Err(ConvertError::ChannelOutOfRange {
            path: src.to_path_buf(),
            index,
            channels: spec.channels,
        });
    }

    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = WavWriter::create(
        dst,
        WavSpec {
            channels: 1,
            ..spec
        },
    )?;

    let channels = usize::from(spec.channels);
    let index = usize::from(index);
    match spec.sample_format {
        SampleFormat::Float => {
            for sample in reader.samples::<f32>().skip(index).step_by(channels) {
                writer.write_sample(sample?)?;
            }
        }
        SampleFormat::Int => {
            for sample in reader.samples::<i32>().skip(index).step_by(channels) {
                writer.write_sample(sample?)?;
            }
        }
    }
    writer.finalize()?;

    tracing::debug!(src = %src.display(), dst = %dst.display(), channel = index, "Channel extracted");
    Ok(())
}

/// Decode an MP3 into a 16-bit PCM WAV
///
/// Returns the path written, which is `dst` with a `.wav` extension.
pub fn mp3_to_wav(src: &Path, dst: &Path) -> Result<PathBuf, ConvertError> {
    let decode_err = |reason: String| ConvertError::Decode {
        path: src.to_path_buf(),
        reason,
    };

    let file = File::open(src)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_err(format!("probe failed: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_err("no audio track".to_string()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(format!("no decoder: {}", e)))?;

    let out_path = wav_output_path(dst);
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer: Option<WavWriter<BufWriter<File>>> = None;
    let mut sample_buf: Option<SampleBuffer<i16>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decode_err(format!("packet read failed: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!(file = %src.display(), "Skipping corrupt packet: {}", e);
                continue;
            }
            Err(e) => return Err(decode_err(format!("decode failed: {}", e))),
        };

        let spec = *decoded.spec();
        let buf = sample_buf.get_or_insert_with(|| SampleBuffer::new(decoded.capacity() as u64, spec));
        buf.copy_interleaved_ref(decoded);

        if writer.is_none() {
            writer = Some(WavWriter::create(
                &out_path,
                WavSpec {
                    channels: spec.channels.count() as u16,
                    sample_rate: spec.rate,
                    bits_per_sample: 16,
                    sample_format: SampleFormat::Int,
                },
            )?);
        }
        if let Some(w) = writer.as_mut() {
            for sample in buf.samples() {
                w.write_sample(*sample)?;
            }
        }
    }

    match writer {
        Some(w) => w.finalize()?,
        None => return Err(decode_err("no audio frames decoded".to_string())),
    }

    tracing::debug!(src = %src.display(), dst = %out_path.display(), "MP3 decoded");
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::wav_header::HeaderDecoder;
    use tempfile::TempDir;

    #[test]
    fn test_pcm_to_wav_header_matches_params() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("raw.pcm");
        let dst = temp_dir.path().join("out/raw.wav");
        std::fs::write(&src, vec![0u8; 32_000]).unwrap();

        pcm_to_wav(&src, &dst, &PcmParams::default()).unwrap();

        let header = HeaderDecoder::new().decode(&dst).unwrap();
        assert_eq!(header.sample_rate, 16_000);
        assert_eq!(header.channels, 1);
        assert_eq!(header.bits_per_sample, 16);
        assert_eq!(header.file_size, 32_044);
        assert!((header.duration_seconds - 1.0).abs() < 1e-9);

        let reader = WavReader::open(&dst).unwrap();
        assert_eq!(reader.len(), 16_000);
    }

    #[test]
    fn test_pcm_params_validation() {
        let params = PcmParams {
            bits_per_sample: 12,
            ..PcmParams::default()
        };
        assert!(matches!(params.validate(), Err(ConvertError::InvalidParams(_))));

        let params = PcmParams {
            channels: 0,
            ..PcmParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_pcm_params_reject_header_overflow() {
        let wide = PcmParams {
            channels: u16::MAX,
            bits_per_sample: 32,
            ..PcmParams::default()
        };
        assert!(matches!(wide.validate(), Err(ConvertError::InvalidParams(_))));

        let fast = PcmParams {
            sample_rate: u32::MAX,
            channels: 2,
            bits_per_sample: 16,
        };
        assert!(matches!(fast.validate(), Err(ConvertError::InvalidParams(_))));

        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("raw.pcm");
        std::fs::write(&src, vec![0u8; 16]).unwrap();
        assert!(pcm_to_wav(&src, &temp_dir.path().join("raw.wav"), &wide).is_err());
        assert!(!temp_dir.path().join("raw.wav").exists());
    }

    #[test]
    fn test_repair_header_keeps_payload() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("broken.wav");
        let dst = temp_dir.path().join("fixed.wav");
        let mut bytes = vec![0xAAu8; HEADER_LEN];
        bytes.extend((0..800u32).map(|i| (i % 256) as u8));
        std::fs::write(&src, &bytes).unwrap();

        let params = PcmParams {
            sample_rate: 8_000,
            channels: 1,
            bits_per_sample: 8,
        };
        repair_header(&src, &dst, &params).unwrap();

        let fixed = std::fs::read(&dst).unwrap();
        assert_eq!(&fixed[..4], b"RIFF");
        assert_eq!(&fixed[HEADER_LEN..], &bytes[HEADER_LEN..]);
        let header = HeaderDecoder::new().decode(&dst).unwrap();
        assert!((header.duration_seconds - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_extract_channel() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("stereo.wav");
        let dst = temp_dir.path().join("right.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&src, spec).unwrap();
        for s in [1i16, -1, 2, -2, 3, -3] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        extract_channel(&src, &dst, 1).unwrap();
        let mut reader = WavReader::open(&dst).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().bits_per_sample, 16);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![-1, -2, -3]);

        assert!(matches!(
            extract_channel(&src, &dst, 2),
            Err(ConvertError::ChannelOutOfRange { index: 2, channels: 2, .. })
        ));
    }

    #[test]
    fn test_mp3_garbage_is_decode_error() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("noise.mp3");
        std::fs::write(&src, b"definitely not an mp3").unwrap();

        assert!(mp3_to_wav(&src, &temp_dir.path().join("noise.mp3")).is_err());
    }

    #[test]
    fn test_file_size_kib() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.bin");
        std::fs::write(&path, vec![0u8; 1536]).unwrap();
        assert_eq!(file_size_kib(&path).unwrap(), 1.5);

        std::fs::write(&path, b"").unwrap();
        assert_eq!(file_size_kib(&path).unwrap(), 0.0);
    }

    #[test]
    fn test_wav_output_path() {
        assert_eq!(wav_output_path(Path::new("a/b.mp3")), PathBuf::from("a/b.wav"));
        assert_eq!(wav_output_path(Path::new("a/b")), PathBuf::from("a/b.wav"));
    }
}
