//! Audio file enumeration
//!
//! Recursive, regex-filtered file discovery. Traversal order is sorted by file
//! name so that every batch run processes files in the same order.

use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// File enumeration errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Pattern does not compile
    #[error("Invalid file pattern '{0}': {1}")]
    InvalidPattern(String, String),
}

/// Recursive file scanner
pub struct FileScanner {
    ignore_patterns: Vec<String>,
}

impl FileScanner {
    /// Create new file scanner with default ignore patterns
    ///
    /// Ignores system files like .DS_Store, Thumbs.db, .git, etc.
    pub fn new() -> Self {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
                ".svn".to_string(),
            ],
        }
    }

    /// Compile a case-insensitive path pattern
    pub fn pattern(pattern: &str) -> Result<Regex, ScanError> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| ScanError::InvalidPattern(pattern.to_string(), e.to_string()))
    }

    /// Pattern matching `.wav` files
    pub fn wav_pattern() -> &'static Regex {
        static WAV_PATTERN: OnceLock<Regex> = OnceLock::new();
        WAV_PATTERN.get_or_init(|| Regex::new(r"(?i)\.wav$").expect("static pattern compiles"))
    }

    /// Recursively list files under `root` whose full path matches `pattern`
    ///
    /// `root` may be a single file. Editor swap files (`.swp`) are always
    /// skipped.
    pub fn scan(&self, root: &Path, pattern: &Regex) -> Result<Vec<PathBuf>, ScanError> {
        if !root.exists() {
            return Err(ScanError::PathNotFound(root.to_path_buf()));
        }

        if root.is_file() {
            return Ok(if Self::accepts(root, pattern) {
                vec![root.to_path_buf()]
            } else {
                Vec::new()
            });
        }

        let mut symlink_visited = HashSet::new();
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e, &mut symlink_visited));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && Self::accepts(entry.path(), pattern) {
                        files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                }
            }
        }

        tracing::debug!(
            root = %root.display(),
            pattern = %pattern.as_str(),
            count = files.len(),
            "Scan complete"
        );

        Ok(files)
    }

    /// `scan` that logs a missing root and yields nothing
    pub fn list_files(&self, root: &Path, pattern: &Regex) -> Vec<PathBuf> {
        match self.scan(root, pattern) {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("{} (pattern {})", e, pattern.as_str());
                Vec::new()
            }
        }
    }

    fn accepts(path: &Path, pattern: &Regex) -> bool {
        let text = path.to_string_lossy();
        pattern.is_match(&text) && !text.ends_with(".swp")
    }

    /// Check if entry should be processed
    fn should_process_entry(
        &self,
        entry: &DirEntry,
        symlink_visited: &mut HashSet<PathBuf>,
    ) -> bool {
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy();

        for pattern in &self.ignore_patterns {
            if file_name.contains(pattern.as_str()) {
                return false;
            }
        }

        // Detect symlink loops
        if entry.file_type().is_symlink() {
            if let Ok(canonical) = path.canonicalize() {
                if !symlink_visited.insert(canonical) {
                    tracing::warn!("Symlink loop detected: {}", path.display());
                    return false;
                }
            }
        }

        true
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}
