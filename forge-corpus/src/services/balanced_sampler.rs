//! Speaker-balanced sampling of one command label
//!
//! Candidates under `<corpus_root>/<label>` are bucketed by the speaker id in
//! their canonical name and drawn round-robin, one per speaker per pass, so no
//! speaker is starved while another has surplus. Accepted files are
//! normalized into a staging directory that is then promoted to
//! `<output_root>/<label>_<tag>_<count>`.
//!
//! Promotion replaces an existing directory of the same name. The old
//! directory is renamed aside first and only removed once the new one is in
//! place, so an interrupted run leaves one of the two intact.

use crate::error::SampleError;
use crate::models::attributes::speaker_id_from_file_name;
use crate::models::{SampleBucket, SelectionResult};
use crate::services::amplitude_normalizer::Normalizer;
use crate::services::file_scanner::FileScanner;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Speaker id for files whose name carries none
pub const UNKNOWN_SPEAKER: &str = "unknown";

/// Compiled include/exclude patterns
///
/// A candidate must match every include pattern and no exclude pattern.
/// Patterns are case-sensitive and matched against the full path.
#[derive(Debug, Clone, Default)]
pub struct SampleFilters {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

/// Why a candidate was accepted or rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterVerdict {
    Accept,
    /// First include pattern the path fails
    MissingInclude(String),
    /// First exclude pattern the path matches
    Excluded(String),
}

impl SampleFilters {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, SampleError> {
        let compile = |patterns: &[String]| -> Result<Vec<Regex>, SampleError> {
            patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|source| SampleError::InvalidPattern {
                        pattern: p.clone(),
                        source,
                    })
                })
                .collect()
        };
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    pub fn verdict(&self, path: &Path) -> FilterVerdict {
        let text = path.to_string_lossy();
        if let Some(re) = self.include.iter().find(|re| !re.is_match(&text)) {
            return FilterVerdict::MissingInclude(re.as_str().to_string());
        }
        if let Some(re) = self.exclude.iter().find(|re| re.is_match(&text)) {
            return FilterVerdict::Excluded(re.as_str().to_string());
        }
        FilterVerdict::Accept
    }
}

/// Group files by speaker id, buckets in first-seen order
pub fn bucket_by_speaker(files: Vec<PathBuf>) -> Vec<SampleBucket> {
    let mut buckets: Vec<SampleBucket> = Vec::new();
    for file in files {
        let speaker = file
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(speaker_id_from_file_name)
            .unwrap_or(UNKNOWN_SPEAKER)
            .to_string();

        match buckets.iter_mut().find(|b| b.speaker_id == speaker) {
            Some(bucket) => bucket.files.push(file),
            None => {
                let mut bucket = SampleBucket::new(speaker);
                bucket.files.push(file);
                buckets.push(bucket);
            }
        }
    }
    buckets
}

/// Full round-robin draw order
///
/// Each pass pops the last file of every non-empty bucket, in bucket order,
/// until all buckets are empty.
pub fn round_robin(mut buckets: Vec<SampleBucket>) -> Vec<PathBuf> {
    let total = buckets.iter().map(|b| b.files.len()).sum();
    let mut order = Vec::with_capacity(total);
    while order.len() < total {
        for bucket in buckets.iter_mut() {
            if let Some(file) = bucket.files.pop() {
                order.push(file);
            }
        }
    }
    order
}

/// Balanced sampler service
pub struct BalancedSampler {
    scanner: FileScanner,
    normalizer: Box<dyn Normalizer>,
    target_peak: f32,
    version_tag: String,
}

impl BalancedSampler {
    pub fn new(normalizer: Box<dyn Normalizer>, target_peak: f32, version_tag: &str) -> Self {
        Self {
            scanner: FileScanner::new(),
            normalizer,
            target_peak,
            version_tag: version_tag.to_string(),
        }
    }

    /// Versioned directory name for `count` selected files
    pub fn versioned_name(&self, label: &str, count: usize) -> String {
        format!("{}_{}_{}", label, self.version_tag, count)
    }

    /// Select up to `max_count` files of `label` and, unless `dry_run`,
    /// promote their normalized copies under `output_root`
    pub fn select(
        &self,
        corpus_root: &Path,
        label: &str,
        max_count: usize,
        filters: &SampleFilters,
        output_root: &Path,
        dry_run: bool,
    ) -> Result<SelectionResult, SampleError> {
        let label_dir = corpus_root.join(label);
        let files = self
            .scanner
            .list_files(&label_dir, FileScanner::wav_pattern());
        if files.is_empty() {
            return Err(SampleError::NoEligibleFiles(label.to_string()));
        }

        let buckets = bucket_by_speaker(files);
        tracing::info!(
            label = %label,
            speakers = buckets.len(),
            "Drawing up to {} files",
            max_count
        );
        let order = round_robin(buckets);

        let staging = if dry_run {
            None
        } else {
            fs::create_dir_all(output_root)?;
            Some(
                tempfile::Builder::new()
                    .prefix(".staging-")
                    .tempdir_in(output_root)?,
            )
        };

        let mut selected = Vec::new();
        let mut excluded = 0;
        let mut failed = 0;

        for candidate in order {
            if selected.len() >= max_count {
                break;
            }

            match filters.verdict(&candidate) {
                FilterVerdict::Accept => {}
                FilterVerdict::MissingInclude(pattern) => {
                    tracing::debug!(file = %candidate.display(), pattern = %pattern, "Not included");
                    excluded += 1;
                    continue;
                }
                FilterVerdict::Excluded(pattern) => {
                    tracing::warn!(file = %candidate.display(), pattern = %pattern, "Excluded");
                    excluded += 1;
                    continue;
                }
            }

            if let Some(staging) = &staging {
                let rel = candidate
                    .strip_prefix(&label_dir)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| PathBuf::from(candidate.file_name().unwrap_or_default()));
                let dst = staging.path().join(rel);
                if let Err(e) = self.normalizer.normalize(&candidate, &dst, self.target_peak) {
                    tracing::error!(file = %candidate.display(), "Normalization failed: {}", e);
                    failed += 1;
                    continue;
                }
            }

            selected.push(candidate);
        }

        if selected.is_empty() {
            return Err(SampleError::NothingSelected {
                label: label.to_string(),
                excluded,
                failed,
            });
        }

        let mut result = SelectionResult {
            label: label.to_string(),
            selected,
            excluded,
            failed,
            output_dir: None,
            replaced_previous: false,
        };

        if let Some(staging) = staging {
            let target = output_root.join(self.versioned_name(label, result.count()));
            result.replaced_previous = promote(staging.path(), &target)?;
            result.output_dir = Some(target);
            // `staging` was renamed away; dropping it finds nothing to remove
        }

        tracing::info!(
            label = %label,
            selected = result.count(),
            excluded = result.excluded,
            failed = result.failed,
            "Label sampled"
        );

        Ok(result)
    }
}

/// Rename `staging` to `target`, replacing any existing `target`
///
/// Returns whether a previous directory was replaced.
pub fn promote(staging: &Path, target: &Path) -> Result<bool, SampleError> {
    let promotion_err = |source| SampleError::Promotion {
        staging: staging.to_path_buf(),
        target: target.to_path_buf(),
        source,
    };

    if !target.exists() {
        fs::rename(staging, target).map_err(promotion_err)?;
        return Ok(false);
    }

    tracing::warn!(
        target = %target.display(),
        "Replacing previous versioned directory"
    );

    let mut aside_name = target.file_name().unwrap_or_default().to_os_string();
    aside_name.push(".previous");
    let aside = target.with_file_name(aside_name);
    if aside.exists() {
        fs::remove_dir_all(&aside).map_err(promotion_err)?;
    }

    fs::rename(target, &aside).map_err(promotion_err)?;
    if let Err(e) = fs::rename(staging, target) {
        if let Err(restore) = fs::rename(&aside, target) {
            tracing::error!(
                previous = %aside.display(),
                "Failed to restore previous directory: {}",
                restore
            );
        }
        return Err(promotion_err(e));
    }

    if let Err(e) = fs::remove_dir_all(&aside) {
        tracing::warn!(previous = %aside.display(), "Failed to remove previous directory: {}", e);
    }

    Ok(true)
}
