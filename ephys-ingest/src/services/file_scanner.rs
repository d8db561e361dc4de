//! Recording-metadata file scanner
//!
//! Recursive discovery of acquisition metadata files (`*.ap.meta` by default)
//! under a subject directory. Results are sorted by path so repeated runs see
//! the same order regardless of filesystem enumeration order.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Filename suffix of SpikeGLX action-potential band metadata
pub const DEFAULT_META_SUFFIX: &str = ".ap.meta";

/// Metadata file scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Metadata file scanner
#[derive(Debug, Clone)]
pub struct FileScanner {
    suffix: String,
    ignore_patterns: Vec<String>,
}

impl FileScanner {
    /// Create new file scanner matching `*.ap.meta`
    ///
    /// Ignores system entries like .DS_Store, Thumbs.db, .git, etc.
    pub fn new() -> Self {
        Self::with_suffix(DEFAULT_META_SUFFIX)
    }

    /// Create a scanner matching a custom filename suffix
    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
                ".svn".to_string(),
                "$RECYCLE.BIN".to_string(),
            ],
        }
    }

    /// Find every metadata file below `root_path`, depth-unbounded, sorted by path
    pub fn find_meta_files(&self, root_path: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory(root_path.to_path_buf()));
        }

        // Symlinks are followed; walkdir reports loops as entry errors
        let walker = WalkDir::new(root_path)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e));

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.is_meta_file(entry.path()) {
                        files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    // Continue scanning, don't abort
                }
            }
        }

        files.sort();

        tracing::debug!(
            root = %root_path.display(),
            files_found = files.len(),
            "Metadata scan completed"
        );

        Ok(files)
    }

    /// Check if entry should be processed
    fn should_process_entry(&self, entry: &DirEntry) -> bool {
        // The root itself is always walked, even if it looks hidden
        if entry.depth() == 0 {
            return true;
        }

        let file_name = entry.file_name().to_string_lossy();
        !self
            .ignore_patterns
            .iter()
            .any(|pattern| file_name.as_ref() == pattern.as_str())
    }

    fn is_meta_file(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| {
                let name = name.to_string_lossy();
                name.len() > self.suffix.len() && name.ends_with(&self.suffix)
            })
            .unwrap_or(false)
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}
