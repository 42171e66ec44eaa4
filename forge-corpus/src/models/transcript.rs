//! Decoded sidecar transcripts

use serde::Serialize;
use std::path::PathBuf;

/// How the transcript encoding was determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Leading byte-order mark
    ByteOrderMark,
    /// Statistical detector above the confidence threshold
    Statistical,
    /// First candidate encoding that decoded strictly and cleanly
    Candidate,
    /// UTF-8 with replacement characters; content may be damaged
    LossyFallback,
}

/// Encoding a transcript was decoded with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodingUsed {
    /// Encoding name, e.g. "UTF-8", "GB18030", "ISO-8859-1"
    pub name: String,
    pub method: DetectionMethod,
}

impl EncodingUsed {
    pub fn new(name: impl Into<String>, method: DetectionMethod) -> Self {
        Self {
            name: name.into(),
            method,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.method == DetectionMethod::LossyFallback
    }
}

/// Sidecar transcript content with its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptRecord {
    pub source_path: PathBuf,
    /// Trimmed decoded text; may be empty
    pub content: String,
    pub encoding: EncodingUsed,
}
