//! Neuropixels acquisition ingest
//!
//! Discovers sessions, probe insertions and clustering runs in a SpikeGLX data
//! tree and registers them into a relational store. Every run is incremental:
//! records already stored are skipped, so repeated runs converge.

pub mod config;
pub mod error;
pub mod ingest;
pub mod services;
pub mod store;

pub use config::{CliOverrides, IngestConfig};
pub use error::{IngestError, IngestResult, Outcome, SkipReason};
pub use ingest::{IngestDriver, IngestReport, PhaseStats};
pub use store::{InsertOptions, SqliteStore, Store};
