//! Canonical 44-byte PCM WAV header decoding
//!
//! Only the first 44 bytes are read. Duration is derived from the file size
//! reported by the filesystem, never from the header's declared RIFF size:
//! field recordings frequently carry a stale declared size.
//!
//! | Field           | Offset | Width |
//! |-----------------|--------|-------|
//! | RIFF chunk size | 4      | 4     |
//! | fmt chunk size  | 16     | 4     |
//! | audio format    | 20     | 2     |
//! | channels        | 22     | 2     |
//! | sample rate     | 24     | 4     |
//! | byte rate       | 28     | 4     |
//! | block align     | 32     | 2     |
//! | bits per sample | 34     | 2     |

use crate::error::DecodeError;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Length of the canonical PCM WAV header
pub const HEADER_LEN: usize = 44;

/// PCM audio format tag
pub const FORMAT_PCM: u16 = 1;

/// Decoded header plus derived timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WavHeader {
    /// Declared RIFF chunk size (bytes 4..8); informational only
    pub data_size_bytes: u32,
    pub fmt_chunk_size: u32,
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// File size from the filesystem
    pub file_size: u64,
    pub sample_width_bytes: u16,
    pub duration_seconds: f64,
    pub frame_count: f64,
}

impl WavHeader {
    /// Decode a header from its raw bytes and the actual file size
    pub fn from_bytes(bytes: &[u8; HEADER_LEN], file_size: u64) -> Result<Self, DecodeError> {
        let u16_at = |offset: usize| u16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
        let u32_at = |offset: usize| {
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };

        let bits_per_sample = u16_at(34);
        let sample_width_bytes = sample_width(bits_per_sample)?;
        let channels = u16_at(22);
        let sample_rate = u32_at(24);

        let bytes_per_second =
            u64::from(channels) * u64::from(sample_rate) * u64::from(sample_width_bytes);
        if bytes_per_second == 0 {
            return Err(DecodeError::MalformedHeader(format!(
                "zero divisor (channels={}, sample_rate={})",
                channels, sample_rate
            )));
        }

        let payload = file_size.saturating_sub(HEADER_LEN as u64);
        let duration_seconds = payload as f64 / bytes_per_second as f64;

        Ok(Self {
            data_size_bytes: u32_at(4),
            fmt_chunk_size: u32_at(16),
            audio_format: u16_at(20),
            channels,
            sample_rate,
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample,
            file_size,
            sample_width_bytes,
            duration_seconds,
            frame_count: f64::from(sample_rate) * duration_seconds,
        })
    }
}

/// Byte width for a bits-per-sample value
pub fn sample_width(bits_per_sample: u16) -> Result<u16, DecodeError> {
    match bits_per_sample {
        8 => Ok(1),
        16 => Ok(2),
        24 => Ok(3),
        32 => Ok(4),
        other => Err(DecodeError::UnsupportedSampleWidth(other)),
    }
}

/// Block align and byte rate, or `None` if either overflows its header field
pub fn pcm_rates(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Option<(u16, u32)> {
    let block_align = channels.checked_mul(bits_per_sample / 8)?;
    let byte_rate = sample_rate.checked_mul(u32::from(block_align))?;
    Some((block_align, byte_rate))
}

/// Build a canonical PCM header for `data_len` payload bytes
///
/// Parameters whose rates overflow (see [`pcm_rates`]) saturate the rate
/// fields; callers validate first.
pub fn build_pcm_header(
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    data_len: u32,
) -> [u8; HEADER_LEN] {
    let (block_align, byte_rate) =
        pcm_rates(channels, sample_rate, bits_per_sample).unwrap_or((u16::MAX, u32::MAX));

    let mut header = [0u8; HEADER_LEN];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&data_len.saturating_add(36).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bits_per_sample.to_le_bytes());
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_len.to_le_bytes());
    header
}

/// WAV header decoder
pub struct HeaderDecoder {}

impl HeaderDecoder {
    pub fn new() -> Self {
        Self {}
    }

    /// Read and decode the first 44 bytes of `path`
    pub fn decode(&self, path: &Path) -> Result<WavHeader, DecodeError> {
        let io_err = |source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file_size = std::fs::metadata(path).map_err(io_err)?.len();

        let mut bytes = [0u8; HEADER_LEN];
        let mut file = File::open(path).map_err(io_err)?;
        if let Err(e) = file.read_exact(&mut bytes) {
            return Err(if e.kind() == std::io::ErrorKind::UnexpectedEof {
                DecodeError::MalformedHeader(format!(
                    "{} is shorter than {} bytes",
                    path.display(),
                    HEADER_LEN
                ))
            } else {
                io_err(e)
            });
        }

        let header = WavHeader::from_bytes(&bytes, file_size)?;

        tracing::debug!(
            file = %path.display(),
            channels = header.channels,
            sample_rate = header.sample_rate,
            bits = header.bits_per_sample,
            duration_s = header.duration_seconds,
            "Decoded WAV header"
        );

        Ok(header)
    }
}

impl Default for HeaderDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_decode_all_supported_widths() {
        for (bits, width) in [(8u16, 1u16), (16, 2), (24, 3), (32, 4)] {
            let payload = 16_000u32 * u32::from(width) * 2;
            let header = build_pcm_header(2, 16_000, bits, payload);
            let file_size = HEADER_LEN as u64 + u64::from(payload);

            let decoded = WavHeader::from_bytes(&header, file_size).unwrap();
            assert_eq!(decoded.sample_width_bytes, width);
            assert_eq!(decoded.channels, 2);
            assert_eq!(decoded.sample_rate, 16_000);
            assert_eq!(decoded.audio_format, FORMAT_PCM);
            assert_eq!(decoded.fmt_chunk_size, 16);
            assert_eq!(decoded.block_align, 2 * width);
            assert_eq!(decoded.byte_rate, 16_000 * 2 * u32::from(width));
            assert!((decoded.duration_seconds - 1.0).abs() < 1e-9);
            assert!(
                (decoded.duration_seconds * f64::from(decoded.sample_rate) - decoded.frame_count)
                    .abs()
                    < 1e-6
            );
        }
    }

    #[test]
    fn test_twelve_bit_is_unsupported() {
        let header = build_pcm_header(1, 8_000, 12, 100);
        match WavHeader::from_bytes(&header, 144) {
            Err(DecodeError::UnsupportedSampleWidth(12)) => {}
            other => panic!("Expected UnsupportedSampleWidth, got {:?}", other),
        }
    }

    #[test]
    fn test_pcm_rates_overflow() {
        assert_eq!(pcm_rates(2, 16_000, 16), Some((4, 64_000)));
        assert_eq!(pcm_rates(u16::MAX, 16_000, 32), None);
        assert_eq!(pcm_rates(2, u32::MAX, 16), None);

        let header = build_pcm_header(u16::MAX, 16_000, 32, 0);
        assert_eq!(&header[32..34], &u16::MAX.to_le_bytes());
    }

    #[test]
    fn test_zero_channels_is_malformed() {
        let header = build_pcm_header(0, 8_000, 16, 100);
        assert!(matches!(
            WavHeader::from_bytes(&header, 144),
            Err(DecodeError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_declared_size_is_ignored_for_duration() {
        // Header claims 10 bytes of audio, file actually holds 32000
        let header = build_pcm_header(1, 16_000, 16, 10);
        let decoded = WavHeader::from_bytes(&header, 44 + 32_000).unwrap();
        assert_eq!(decoded.data_size_bytes, 46);
        assert!((decoded.duration_seconds - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_decode_file_reads_filesystem_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("clip.wav");
        let mut bytes = build_pcm_header(1, 8_000, 16, 0).to_vec();
        bytes.extend(std::iter::repeat(0u8).take(8_000));
        std::fs::write(&path, &bytes).unwrap();

        let decoded = HeaderDecoder::new().decode(&path).unwrap();
        assert_eq!(decoded.file_size, 8_044);
        assert!((decoded.duration_seconds - 0.5).abs() < 1e-9);
        assert!((decoded.frame_count - 4_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_truncated_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("short.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        assert!(matches!(
            HeaderDecoder::new().decode(&path),
            Err(DecodeError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_decode_missing_file() {
        assert!(matches!(
            HeaderDecoder::new().decode(Path::new("/nonexistent/clip.wav")),
            Err(DecodeError::Io { .. })
        ));
    }
}
