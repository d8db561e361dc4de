//! Reconciliation driver
//!
//! Runs the three ingest phases strictly in order against an injected store:
//!
//! SESSIONS → PROBE INSERTIONS → CLUSTERINGS
//!
//! Each phase compares what discovery finds on disk with the keys already
//! stored and inserts only the difference. Re-running over an unchanged data
//! tree inserts nothing.

mod phase_clustering;
mod phase_insertions;
mod phase_sessions;
pub mod statistics;

pub use statistics::{IngestReport, PhaseStats};

use crate::config::IngestConfig;
use crate::error::{IngestResult, SkipReason};
use crate::services::{Discovery, FileScanner};
use crate::store::Store;
use tracing::{info, warn};

/// Ingest driver over a [`Store`]
pub struct IngestDriver<S: Store> {
    store: S,
    config: IngestConfig,
    discovery: Discovery,
}

impl<S: Store> IngestDriver<S> {
    pub fn new(store: S, config: IngestConfig) -> Self {
        let discovery = Discovery::new(
            config.root_data_dirs.clone(),
            FileScanner::with_suffix(config.meta_suffix.clone()),
        );

        Self {
            store,
            config,
            discovery,
        }
    }

    /// Run every phase once
    ///
    /// Per-record problems are logged and counted in the report; persistence
    /// failures abort the run.
    pub async fn run(&self) -> IngestResult<IngestReport> {
        info!(roots = ?self.discovery.roots(), "Starting ingest");

        let mut report = IngestReport::default();

        report.sessions = self.phase_sessions().await?;

        let (insertions, probes_inserted) = self.phase_insertions().await?;
        report.probe_insertions = insertions;
        report.probes_inserted = probes_inserted;

        let (recordings, clusterings) = self.phase_clustering().await?;
        report.ephys_recordings = recordings;
        report.clusterings = clusterings;

        info!(
            inserted = report.total_inserted(),
            skipped = report.total_skipped(),
            "Ingest complete"
        );

        Ok(report)
    }
}

/// Log a skipped candidate and count it
fn record_skip(stats: &mut PhaseStats, phase: &'static str, reason: &SkipReason) {
    warn!(phase, "Skipping: {}", reason);
    stats.skipped += 1;
}
