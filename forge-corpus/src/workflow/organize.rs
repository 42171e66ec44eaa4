//! Organize workflow: classify every WAV under a tree and relocate it

use crate::models::{FailureStage, FileFailure, OrganizeReport};
use crate::services::corpus_organizer::{CorpusOrganizer, OrganizeOutcome};
use crate::services::file_scanner::FileScanner;
use crate::services::metadata_classifier::MetadataClassifier;
use rayon::prelude::*;
use std::path::Path;

/// Classify and move (or preview) every `.wav` under `input`
///
/// Classification runs in parallel; moves run afterwards, one at a time, in
/// scan order.
pub fn run_organize(
    classifier: &MetadataClassifier,
    organizer: &CorpusOrganizer,
    input: &Path,
    output_root: &Path,
    preview: bool,
) -> OrganizeReport {
    let mut report = OrganizeReport::new(input, output_root, preview);

    let files = FileScanner::new().list_files(input, FileScanner::wav_pattern());
    report.total_files = files.len();
    tracing::info!(input = %input.display(), files = files.len(), preview, "Organizing");

    let classified: Vec<_> = files
        .par_iter()
        .map(|file| classifier.classify(file, output_root))
        .collect();

    for (file, result) in files.iter().zip(classified) {
        let name = match result {
            Ok(name) => name,
            Err(e) => {
                tracing::error!(file = %file.display(), "Skipped: {}", e);
                report
                    .failures
                    .push(FileFailure::new(file, FailureStage::Classify, e.to_string()));
                continue;
            }
        };

        if !name.is_well_formed() {
            report.malformed_names += 1;
        }

        match organizer.organize(file, &name.path(), preview) {
            Ok(OrganizeOutcome::Previewed { .. }) => report.previewed += 1,
            Ok(OrganizeOutcome::Moved { .. }) => report.moved += 1,
            Ok(OrganizeOutcome::AlreadyInPlace(_)) => report.already_in_place += 1,
            Ok(OrganizeOutcome::DuplicateSkipped { .. }) => report.duplicates += 1,
            Err(e) => {
                tracing::error!("{}", e);
                report
                    .failures
                    .push(FileFailure::new(file, FailureStage::Organize, e.to_string()));
            }
        }
    }

    report.finish();
    tracing::info!(
        total = report.total_files,
        moved = report.moved,
        previewed = report.previewed,
        duplicates = report.duplicates,
        failed = report.failures.len(),
        "Organize complete"
    );
    report
}
