//! Relocation of classified recordings to their canonical path
//!
//! Moves are a single `rename`, so a failed move leaves the source where it
//! was. Cross-device moves are reported as failures rather than degraded to a
//! copy. The corpus is assumed to have a single writer for the duration of a
//! run.
//!
//! Canonical names embed the content digest, so an existing destination of
//! the same size is the same recording and is skipped as a duplicate. One of
//! a different size is a conflict and fails the move.

use crate::error::OrganizeError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What `organize` did (or would do) with one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizeOutcome {
    /// Preview only; nothing touched
    Previewed { src: PathBuf, dst: PathBuf },
    Moved { src: PathBuf, dst: PathBuf },
    /// Source already is the canonical file
    AlreadyInPlace(PathBuf),
    /// Canonical file of the same size exists; source left alone
    DuplicateSkipped { src: PathBuf, dst: PathBuf },
}

/// Corpus organizer service
pub struct CorpusOrganizer {}

impl CorpusOrganizer {
    pub fn new() -> Self {
        Self {}
    }

    /// Move `src` to `dst`, or only report the mapping when `preview` is set
    pub fn organize(
        &self,
        src: &Path,
        dst: &Path,
        preview: bool,
    ) -> Result<OrganizeOutcome, OrganizeError> {
        if preview {
            tracing::info!(src = %src.display(), dst = %dst.display(), "Preview");
            return Ok(OrganizeOutcome::Previewed {
                src: src.to_path_buf(),
                dst: dst.to_path_buf(),
            });
        }

        let move_failed = |cause| OrganizeError::MoveFailed {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            cause,
        };

        if dst.exists() {
            if is_same_file(src, dst) {
                tracing::debug!(file = %dst.display(), "Already in place");
                return Ok(OrganizeOutcome::AlreadyInPlace(dst.to_path_buf()));
            }
            let src_len = fs::metadata(src).map_err(move_failed)?.len();
            let dst_len = fs::metadata(dst).map_err(move_failed)?.len();
            if src_len != dst_len {
                return Err(move_failed(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!(
                        "destination exists with different content ({} vs {} bytes)",
                        dst_len, src_len
                    ),
                )));
            }
            tracing::warn!(
                src = %src.display(),
                dst = %dst.display(),
                "Destination exists, skipping duplicate"
            );
            return Ok(OrganizeOutcome::DuplicateSkipped {
                src: src.to_path_buf(),
                dst: dst.to_path_buf(),
            });
        }

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(move_failed)?;
        }
        fs::rename(src, dst).map_err(move_failed)?;

        tracing::debug!(src = %src.display(), dst = %dst.display(), "Moved");

        Ok(OrganizeOutcome::Moved {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
        })
    }
}

impl Default for CorpusOrganizer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_preview_touches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("raw/a.wav");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::write(&src, b"audio").unwrap();
        let dst = temp_dir.path().join("out/x/y/a.wav");

        let outcome = CorpusOrganizer::new().organize(&src, &dst, true).unwrap();

        assert!(matches!(outcome, OrganizeOutcome::Previewed { .. }));
        assert!(src.exists());
        assert!(!temp_dir.path().join("out").exists());
    }

    #[test]
    fn test_move_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("a.wav");
        fs::write(&src, b"audio").unwrap();
        let dst = temp_dir.path().join("out/x/y/b.wav");

        let outcome = CorpusOrganizer::new().organize(&src, &dst, false).unwrap();

        assert_eq!(
            outcome,
            OrganizeOutcome::Moved {
                src: src.clone(),
                dst: dst.clone()
            }
        );
        assert!(!src.exists());
        assert_eq!(fs::read(&dst).unwrap(), b"audio");
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let dst = temp_dir.path().join("out/b.wav");
        fs::create_dir_all(dst.parent().unwrap()).unwrap();
        fs::write(&dst, b"audio").unwrap();

        let outcome = CorpusOrganizer::new().organize(&dst, &dst, false).unwrap();
        assert_eq!(outcome, OrganizeOutcome::AlreadyInPlace(dst.clone()));
        assert!(dst.exists());
    }

    #[test]
    fn test_existing_destination_is_duplicate() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("a.wav");
        let dst = temp_dir.path().join("b.wav");
        fs::write(&src, b"audio").unwrap();
        fs::write(&dst, b"audio").unwrap();

        let outcome = CorpusOrganizer::new().organize(&src, &dst, false).unwrap();
        assert!(matches!(outcome, OrganizeOutcome::DuplicateSkipped { .. }));
        assert!(src.exists());
    }

    #[test]
    fn test_failed_move_leaves_source() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("missing.wav");
        let dst = temp_dir.path().join("out/b.wav");

        let result = CorpusOrganizer::new().organize(&src, &dst, false);
        assert!(matches!(result, Err(OrganizeError::MoveFailed { .. })));
        assert!(!dst.exists());
    }

    #[test]
    fn test_conflicting_destination_fails() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("a.wav");
        let dst = temp_dir.path().join("b.wav");
        fs::write(&src, b"audio").unwrap();
        fs::write(&dst, b"other audio").unwrap();

        let result = CorpusOrganizer::new().organize(&src, &dst, false);
        match result {
            Err(OrganizeError::MoveFailed { cause, .. }) => {
                assert_eq!(cause.kind(), io::ErrorKind::AlreadyExists);
            }
            other => panic!("Expected MoveFailed, got {:?}", other),
        }
        assert_eq!(fs::read(&src).unwrap(), b"audio");
        assert_eq!(fs::read(&dst).unwrap(), b"other audio");
    }
}
