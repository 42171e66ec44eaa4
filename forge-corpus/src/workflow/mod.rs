//! Batch drivers
//!
//! Each driver applies one service across a file tree or label list. Per-file
//! and per-label errors are logged, recorded in the run report and skipped;
//! only setup errors abort a run.

pub mod basic;
pub mod organize;
pub mod sample;

pub use basic::{run_basic, BasicOperation, BasicOptions};
pub use organize::run_organize;
pub use sample::{read_labels, run_sample, SampleOptions};

use std::path::{Path, PathBuf};

/// `output_root` plus the position of `file` relative to `input`
///
/// A single-file `input` maps to `output_root/<file name>`.
pub(crate) fn mirror_path(input: &Path, file: &Path, output_root: &Path) -> PathBuf {
    match file.strip_prefix(input) {
        Ok(rel) if !rel.as_os_str().is_empty() => output_root.join(rel),
        _ => output_root.join(file.file_name().unwrap_or_default()),
    }
}
