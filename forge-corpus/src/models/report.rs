//! Batch run summaries
//!
//! Written as pretty JSON when `--report` is given.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Error stage of a skipped file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureStage {
    Classify,
    Organize,
    Process,
}

/// One file that was skipped during a batch
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub file_path: PathBuf,
    pub stage: FailureStage,
    pub error_message: String,
    pub occurred_at: DateTime<Utc>,
}

impl FileFailure {
    pub fn new(file_path: &Path, stage: FailureStage, error_message: impl Into<String>) -> Self {
        Self {
            file_path: file_path.to_path_buf(),
            stage,
            error_message: error_message.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Summary of an organize run
#[derive(Debug, Clone, Serialize)]
pub struct OrganizeReport {
    pub input: PathBuf,
    pub output_root: PathBuf,
    pub preview: bool,
    pub total_files: usize,
    pub moved: usize,
    pub previewed: usize,
    pub already_in_place: usize,
    pub duplicates: usize,
    /// Relocated despite a malformed canonical name
    pub malformed_names: usize,
    pub failures: Vec<FileFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl OrganizeReport {
    pub fn new(input: &Path, output_root: &Path, preview: bool) -> Self {
        Self {
            input: input.to_path_buf(),
            output_root: output_root.to_path_buf(),
            preview,
            total_files: 0,
            moved: 0,
            previewed: 0,
            already_in_place: 0,
            duplicates: 0,
            malformed_names: 0,
            failures: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

/// Per-label line of a sample run
#[derive(Debug, Clone, Serialize)]
pub struct LabelSummary {
    pub label: String,
    pub selected: usize,
    pub excluded: usize,
    pub failed: usize,
    pub output_dir: Option<PathBuf>,
    pub replaced_previous: bool,
}

/// Summary of a sample run
#[derive(Debug, Clone, Serialize)]
pub struct SampleReport {
    pub corpus_root: PathBuf,
    pub output_root: PathBuf,
    pub max_per_label: usize,
    pub dry_run: bool,
    pub labels: Vec<LabelSummary>,
    /// Labels that produced no selection, with the reason
    pub missing_labels: Vec<(String, String)>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SampleReport {
    pub fn new(corpus_root: &Path, output_root: &Path, max_per_label: usize, dry_run: bool) -> Self {
        Self {
            corpus_root: corpus_root.to_path_buf(),
            output_root: output_root.to_path_buf(),
            max_per_label,
            dry_run,
            labels: Vec::new(),
            missing_labels: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

/// Summary of a basic-operation run
#[derive(Debug, Clone, Serialize)]
pub struct BasicReport {
    pub operation: String,
    pub total_files: usize,
    pub processed: usize,
    /// Sum of WAV durations, filled by the `duration` operation
    pub total_duration_seconds: f64,
    pub failures: Vec<FileFailure>,
}

/// Write any report as pretty JSON
pub fn write_report<T: Serialize>(report: &T, path: &Path) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, json)
}
