//! Error types for ephys-ingest
//!
//! Two tiers:
//! - [`SkipReason`]: per-record recoverable condition. The record is logged
//!   and skipped; the phase continues.
//! - [`IngestError`]: fatal for the run (persistence failures, populate
//!   failures when errors are not suppressed).

use std::path::PathBuf;
use thiserror::Error;

/// Why a single candidate record was skipped
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    /// Probe directory name has no trailing ordinal
    #[error("Malformed probe directory name '{name}' ({path})")]
    MalformedDirectoryName { name: String, path: PathBuf },

    /// Metadata file could not be read or parsed
    #[error("Unreadable metadata file {path}: {reason}")]
    UnreadableMeta { path: PathBuf, reason: String },

    /// Another metadata file already claimed this insertion number
    #[error("Duplicate insertion number {insertion_number} ({path})")]
    DuplicateInsertion { insertion_number: u32, path: PathBuf },

    /// Subject directory could not be traversed
    #[error("Scan failed: {0}")]
    Scan(String),

    /// No acquisition metadata matches a probe insertion
    #[error("No recording metadata found for {0}")]
    MissingRecording(String),

    /// No spike-sorting output next to a recording
    #[error("No sort output found under {0}")]
    MissingSortOutput(PathBuf),

    /// Sort output exists but could not be inspected
    #[error("Clustering info unavailable: {0}")]
    ClusteringInfo(String),
}

/// Per-record result: the candidate, or the reason it was skipped
pub type Outcome<T> = std::result::Result<T, SkipReason>;

/// Fatal ingest error
#[derive(Debug, Error)]
pub enum IngestError {
    /// Persistence, configuration or I/O failure from ephys-common
    #[error(transparent)]
    Common(#[from] ephys_common::Error),

    /// Populate step failed and errors were not suppressed
    #[error("Populate failed for {key}: {reason}")]
    Populate { key: String, reason: String },
}

/// Result type for ingest operations
pub type IngestResult<T> = std::result::Result<T, IngestError>;

impl From<sqlx::Error> for IngestError {
    fn from(err: sqlx::Error) -> Self {
        IngestError::Common(ephys_common::Error::Database(err))
    }
}
