//! Discovery and extraction services
//!
//! Read-only filesystem helpers used by the ingest phases.

pub mod clustering_info;
pub mod discovery;
pub mod ephys_recording;
pub mod file_scanner;
pub mod meta_reader;
pub mod probe_dir;

pub use clustering_info::{extract_clustering_info, resolve_sort_output_dir, ClusteringInfo};
pub use discovery::{Discovery, InsertionCandidate};
pub use ephys_recording::{populate, PopulateReport};
pub use file_scanner::{FileScanner, ScanError, DEFAULT_META_SUFFIX};
pub use meta_reader::{MetaError, RecordingMeta};
pub use probe_dir::{parse_probe_dir_name, probe_ordinal, ProbeDirError};
