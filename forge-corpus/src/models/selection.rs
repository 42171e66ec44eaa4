//! Balanced sampling value types

use serde::Serialize;
use std::path::PathBuf;

/// Candidate files of one speaker for one label
///
/// Files are drawn from the end of `files`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBucket {
    pub speaker_id: String,
    pub files: Vec<PathBuf>,
}

impl SampleBucket {
    pub fn new(speaker_id: impl Into<String>) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            files: Vec::new(),
        }
    }
}

/// Outcome of sampling one label
#[derive(Debug, Clone, Serialize)]
pub struct SelectionResult {
    pub label: String,
    /// Source paths of the selected files, in draw order
    pub selected: Vec<PathBuf>,
    /// Candidates dropped by include/exclude filters
    pub excluded: usize,
    /// Candidates that passed the filters but failed normalization
    pub failed: usize,
    /// Versioned output directory; `None` for a dry run
    pub output_dir: Option<PathBuf>,
    /// A previous versioned directory of the same name was replaced
    pub replaced_previous: bool,
}

impl SelectionResult {
    pub fn count(&self) -> usize {
        self.selected.len()
    }
}
