//! Sidecar transcript discovery and encoding detection
//!
//! Transcripts arrive in whatever encoding the recording station used. The
//! decoder tries, in order:
//!
//! 1. a byte-order mark,
//! 2. an optional statistical detector, trusted only above a threshold,
//! 3. a configured list of candidate encodings, each decoded strictly and
//!    rejected if the text contains control characters other than tab/LF/CR,
//! 4. lossy UTF-8, flagged as degraded.
//!
//! Latin-1 accepts almost any byte sequence, so it shadows every candidate
//! listed after it. Legacy CJK transcripts are only recognized when a CJK
//! encoding precedes Latin-1 in the list or the statistical detector is on.

use crate::config::SnifferConfig;
use crate::error::DecodeError;
use crate::models::{DetectionMethod, EncodingUsed, TranscriptRecord};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use std::ffi::OsString;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Encoding guess from a statistical detector
#[derive(Debug, Clone, Copy)]
pub struct Detection {
    pub encoding: &'static Encoding,
    /// In [0, 1]
    pub confidence: f32,
}

/// Pluggable statistical encoding detector
pub trait EncodingDetector: Send + Sync {
    fn detect(&self, bytes: &[u8]) -> Option<Detection>;
}

/// `chardetng`-backed detector
///
/// chardetng returns a guess without a score. The reported confidence is a
/// two-level proxy rather than a probability: [`CLEAN_GUESS_CONFIDENCE`] when
/// the input is non-ASCII and the guess decodes it without errors,
/// [`UNSURE_GUESS_CONFIDENCE`] otherwise. With the default threshold of 0.9
/// the threshold therefore means "accept clean non-ASCII guesses only".
#[cfg(feature = "statistical-detection")]
pub struct StatisticalDetector;

#[cfg(feature = "statistical-detection")]
pub const CLEAN_GUESS_CONFIDENCE: f32 = 0.95;

#[cfg(feature = "statistical-detection")]
pub const UNSURE_GUESS_CONFIDENCE: f32 = 0.5;

#[cfg(feature = "statistical-detection")]
impl EncodingDetector for StatisticalDetector {
    fn detect(&self, bytes: &[u8]) -> Option<Detection> {
        let mut detector = chardetng::EncodingDetector::new();
        detector.feed(bytes, true);
        let encoding = detector.guess(None, true);

        let clean = encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .is_some();
        let confidence = if clean && !bytes.is_ascii() {
            CLEAN_GUESS_CONFIDENCE
        } else {
            UNSURE_GUESS_CONFIDENCE
        };

        Some(Detection {
            encoding,
            confidence,
        })
    }
}

/// One entry of the candidate list
#[derive(Debug, Clone, Copy)]
enum Candidate {
    Ascii,
    /// ISO-8859-1 proper, one byte per code point
    Latin1,
    Standard(&'static Encoding),
}

impl Candidate {
    fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "ascii" | "us-ascii" => Some(Candidate::Ascii),
            // WHATWG maps these labels to windows-1252
            "latin-1" | "latin1" | "l1" | "iso-8859-1" | "iso8859-1" => Some(Candidate::Latin1),
            other => Encoding::for_label(other.as_bytes()).map(Candidate::Standard),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Candidate::Ascii => "ASCII",
            Candidate::Latin1 => "ISO-8859-1",
            Candidate::Standard(encoding) => encoding.name(),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Candidate::Ascii => {
                if bytes.is_ascii() {
                    Some(bytes.iter().map(|&b| b as char).collect())
                } else {
                    None
                }
            }
            Candidate::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            Candidate::Standard(encoding) => encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
        }
    }
}

/// Byte-order marks, longest first so UTF-32LE wins over UTF-16LE
#[derive(Debug, Clone, Copy)]
enum Bom {
    Utf32Le,
    Utf32Be,
    Utf16Le,
    Utf16Be,
    Utf8,
}

const BOM_TABLE: [(&[u8], Bom); 5] = [
    (&[0xFF, 0xFE, 0x00, 0x00], Bom::Utf32Le),
    (&[0x00, 0x00, 0xFE, 0xFF], Bom::Utf32Be),
    (&[0xFF, 0xFE], Bom::Utf16Le),
    (&[0xFE, 0xFF], Bom::Utf16Be),
    (&[0xEF, 0xBB, 0xBF], Bom::Utf8),
];

impl Bom {
    fn name(&self) -> &'static str {
        match self {
            Bom::Utf32Le => "UTF-32LE",
            Bom::Utf32Be => "UTF-32BE",
            Bom::Utf16Le => UTF_16LE.name(),
            Bom::Utf16Be => UTF_16BE.name(),
            Bom::Utf8 => UTF_8.name(),
        }
    }

    fn decode(&self, payload: &[u8]) -> Option<String> {
        let standard = |encoding: &'static Encoding| {
            encoding
                .decode_without_bom_handling_and_without_replacement(payload)
                .map(|text| text.into_owned())
        };
        match self {
            Bom::Utf32Le => decode_utf32(payload, u32::from_le_bytes),
            Bom::Utf32Be => decode_utf32(payload, u32::from_be_bytes),
            Bom::Utf16Le => standard(UTF_16LE),
            Bom::Utf16Be => standard(UTF_16BE),
            Bom::Utf8 => standard(UTF_8),
        }
    }
}

/// encoding_rs does not implement UTF-32
fn decode_utf32(payload: &[u8], to_u32: fn([u8; 4]) -> u32) -> Option<String> {
    if payload.len() % 4 != 0 {
        return None;
    }
    payload
        .chunks_exact(4)
        .map(|chunk| char::from_u32(to_u32([chunk[0], chunk[1], chunk[2], chunk[3]])))
        .collect()
}

fn has_disallowed_control(text: &str) -> bool {
    text.chars()
        .any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
}

/// Transcript locator and decoder
pub struct EncodingSniffer {
    read_limit: usize,
    sidecar_suffixes: Vec<String>,
    candidates: Vec<Candidate>,
    detector: Option<Box<dyn EncodingDetector>>,
    detection_threshold: f32,
}

impl EncodingSniffer {
    /// Build from configuration
    ///
    /// Unknown candidate labels are logged and skipped. Statistical detection
    /// is only available with the `statistical-detection` feature.
    pub fn new(config: &SnifferConfig) -> Self {
        let candidates = config
            .candidate_encodings
            .iter()
            .filter_map(|label| {
                let candidate = Candidate::from_label(label);
                if candidate.is_none() {
                    tracing::warn!(label = %label, "Unknown candidate encoding, ignored");
                }
                candidate
            })
            .collect();

        let sniffer = Self {
            read_limit: config.read_limit,
            sidecar_suffixes: config.sidecar_suffixes.clone(),
            candidates,
            detector: None,
            detection_threshold: config.detection_threshold,
        };

        if config.statistical_detection {
            #[cfg(feature = "statistical-detection")]
            return sniffer.with_detector(Box::new(StatisticalDetector));

            #[cfg(not(feature = "statistical-detection"))]
            tracing::warn!(
                "Statistical encoding detection requested but not compiled in \
                 (enable the statistical-detection feature)"
            );
        }

        sniffer
    }

    /// Install a statistical detector
    pub fn with_detector(mut self, detector: Box<dyn EncodingDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Decode transcript bytes to trimmed text
    ///
    /// Only a byte-order mark whose payload fails to decode is an error;
    /// otherwise the lossy fallback always produces a string.
    pub fn sniff_and_decode(&self, bytes: &[u8]) -> Result<(String, EncodingUsed), DecodeError> {
        if let Some((mark, bom)) = BOM_TABLE.iter().find(|(mark, _)| bytes.starts_with(mark)) {
            let text = bom.decode(&bytes[mark.len()..]).ok_or_else(|| {
                DecodeError::Undecodable(format!("invalid {} after byte-order mark", bom.name()))
            })?;
            return Ok((
                text.trim().to_string(),
                EncodingUsed::new(bom.name(), DetectionMethod::ByteOrderMark),
            ));
        }

        if let Some(detector) = &self.detector {
            if let Some(detection) = detector.detect(bytes) {
                if detection.confidence > self.detection_threshold {
                    let candidate = Candidate::Standard(detection.encoding);
                    if let Some(text) = candidate.decode(bytes) {
                        return Ok((
                            text.trim().to_string(),
                            EncodingUsed::new(candidate.name(), DetectionMethod::Statistical),
                        ));
                    }
                }
                tracing::trace!(
                    encoding = detection.encoding.name(),
                    confidence = detection.confidence,
                    "Statistical guess not used"
                );
            }
        }

        for candidate in &self.candidates {
            if let Some(text) = candidate.decode(bytes) {
                if !has_disallowed_control(&text) {
                    return Ok((
                        text.trim().to_string(),
                        EncodingUsed::new(candidate.name(), DetectionMethod::Candidate),
                    ));
                }
            }
        }

        let text = String::from_utf8_lossy(bytes);
        Ok((
            text.trim().to_string(),
            EncodingUsed::new(UTF_8.name(), DetectionMethod::LossyFallback),
        ))
    }

    /// First existing sidecar transcript for `audio_path`
    ///
    /// Suffixes are appended to the path with a trailing `.wav` removed.
    pub fn find_sidecar(&self, audio_path: &Path) -> Result<PathBuf, DecodeError> {
        let base = match audio_path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("wav") => audio_path.with_extension(""),
            _ => audio_path.to_path_buf(),
        };

        self.sidecar_suffixes
            .iter()
            .map(|suffix| {
                let mut candidate = OsString::from(base.as_os_str());
                candidate.push(suffix);
                PathBuf::from(candidate)
            })
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| DecodeError::SidecarNotFound(audio_path.to_path_buf()))
    }

    /// Locate, read (up to the read limit) and decode the transcript of `audio_path`
    pub fn read_transcript(&self, audio_path: &Path) -> Result<TranscriptRecord, DecodeError> {
        let sidecar = self.find_sidecar(audio_path)?;

        let io_err = |source| DecodeError::Io {
            path: sidecar.clone(),
            source,
        };
        let file = File::open(&sidecar).map_err(io_err)?;
        let mut bytes = Vec::new();
        file.take(self.read_limit as u64)
            .read_to_end(&mut bytes)
            .map_err(io_err)?;

        let (content, encoding) = self.sniff_and_decode(&bytes)?;

        if encoding.is_degraded() {
            tracing::warn!(
                transcript = %sidecar.display(),
                "Transcript decoded lossily; content may be damaged"
            );
        } else {
            tracing::debug!(
                transcript = %sidecar.display(),
                encoding = %encoding.name,
                "Decoded transcript"
            );
        }

        Ok(TranscriptRecord {
            source_path: sidecar,
            content,
            encoding,
        })
    }
}
