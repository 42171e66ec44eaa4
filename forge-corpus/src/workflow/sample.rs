//! Sample workflow: balanced selection for every label in a list

use crate::models::{LabelSummary, SampleReport};
use crate::services::balanced_sampler::{BalancedSampler, SampleFilters};
use std::path::{Path, PathBuf};

/// Per-run sampling settings
#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub corpus_root: PathBuf,
    pub output_root: PathBuf,
    pub max_per_label: usize,
    pub dry_run: bool,
}

/// Labels from a file (one per line) or, if `source` is not a file, the
/// literal label itself
pub fn read_labels(source: &str) -> std::io::Result<Vec<String>> {
    let path = Path::new(source);
    if !path.is_file() {
        let label = source.trim();
        return Ok(if label.is_empty() {
            Vec::new()
        } else {
            vec![label.to_string()]
        });
    }

    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Sample every label; failed labels are collected, not fatal
pub fn run_sample(
    sampler: &BalancedSampler,
    filters: &SampleFilters,
    labels: &[String],
    options: &SampleOptions,
) -> SampleReport {
    let mut report = SampleReport::new(
        &options.corpus_root,
        &options.output_root,
        options.max_per_label,
        options.dry_run,
    );

    if !options.dry_run {
        tracing::warn!(
            output = %options.output_root.display(),
            "Existing versioned directories with the same name will be replaced"
        );
    }

    for label in labels {
        match sampler.select(
            &options.corpus_root,
            label,
            options.max_per_label,
            filters,
            &options.output_root,
            options.dry_run,
        ) {
            Ok(result) => {
                if options.dry_run {
                    for file in &result.selected {
                        tracing::info!(label = %label, "Would select {}", file.display());
                    }
                }
                report.labels.push(LabelSummary {
                    label: result.label.clone(),
                    selected: result.count(),
                    excluded: result.excluded,
                    failed: result.failed,
                    output_dir: result.output_dir.clone(),
                    replaced_previous: result.replaced_previous,
                });
            }
            Err(e) => {
                tracing::error!(label = %label, "{}", e);
                report.missing_labels.push((label.clone(), e.to_string()));
            }
        }
    }

    report.finish();

    if !report.missing_labels.is_empty() {
        let names: Vec<&str> = report
            .missing_labels
            .iter()
            .map(|(label, _)| label.as_str())
            .collect();
        tracing::warn!(
            count = names.len(),
            "Labels without a selection: {}",
            names.join(", ")
        );
    }
    tracing::info!(
        sampled = report.labels.len(),
        missing = report.missing_labels.len(),
        "Sampling complete"
    );

    report
}
