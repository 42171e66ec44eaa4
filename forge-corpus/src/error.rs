//! Error types for forge-corpus
//!
//! One enum per pipeline stage. Per-file errors are recovered by the batch
//! workflows (logged and skipped); per-label sampling errors are collected and
//! reported once the whole label batch is done.

use std::path::PathBuf;
use thiserror::Error;

/// WAV header and transcript decoding errors
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Underlying read failed
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Header is truncated or yields a zero divisor
    #[error("Malformed WAV header: {0}")]
    MalformedHeader(String),

    /// Bits per sample not in {8, 16, 24, 32}
    #[error("Unsupported sample width: {0} bits per sample")]
    UnsupportedSampleWidth(u16),

    /// No sidecar transcript next to the audio file
    #[error("Sidecar transcript not found for {0}")]
    SidecarNotFound(PathBuf),

    /// A byte-order mark was found but the payload does not decode
    #[error("Undecodable transcript: {0}")]
    Undecodable(String),
}

/// Content digest errors
#[derive(Debug, Error)]
pub enum HashError {
    /// Path does not exist or is not a regular file
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Read failed part-way through hashing
    #[error("Failed to read {path} for hashing: {source}")]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Metadata classification errors
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Transcript missing, undecodable or empty; the file is skipped
    #[error("No transcript for {path}: {reason}")]
    NoTranscript { path: PathBuf, reason: String },

    /// Digest of the audio file failed
    #[error(transparent)]
    Hash(#[from] HashError),

    /// Canonical name does not split into the expected token count
    ///
    /// Only returned when strict naming is enabled; otherwise logged.
    #[error("Malformed canonical name {name}: {tokens} tokens, expected {expected}")]
    MalformedName {
        name: String,
        tokens: usize,
        expected: usize,
    },
}

/// Corpus relocation errors
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Directory creation or rename failed; the source is untouched
    #[error("Failed to move {src} to {dst}: {cause}")]
    MoveFailed {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        cause: std::io::Error,
    },
}

/// Per-label sampling errors
#[derive(Debug, Error)]
pub enum SampleError {
    /// No WAV files exist under the label directory
    #[error("No eligible files for label '{0}'")]
    NoEligibleFiles(String),

    /// Candidates existed but none survived filtering and normalization
    #[error("Nothing selected for label '{label}' ({excluded} excluded, {failed} failed)")]
    NothingSelected {
        label: String,
        excluded: usize,
        failed: usize,
    },

    /// Include/exclude pattern does not compile
    #[error("Invalid filter pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Staging or promotion of the versioned directory failed
    #[error("Failed to promote {staging} to {target}: {source}")]
    Promotion {
        staging: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
