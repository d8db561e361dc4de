//! Ingest run statistics
//!
//! One [`PhaseStats`] per phase plus the populate report, aggregated into the
//! [`IngestReport`] returned by a run.

use crate::services::PopulateReport;
use serde::Serialize;

/// Counters for one phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhaseStats {
    /// Candidates produced by discovery
    pub discovered: usize,
    /// Candidates whose key was already stored
    pub already_present: usize,
    /// Candidates skipped for a recoverable reason
    pub skipped: usize,
    /// Rows actually inserted
    pub inserted: usize,
}

impl PhaseStats {
    pub fn display_string(&self, entity: &str) -> String {
        format!(
            "{}: {} discovered, {} already present, {} skipped, {} inserted",
            entity, self.discovered, self.already_present, self.skipped, self.inserted
        )
    }
}

/// Result of one ingest run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub sessions: PhaseStats,
    /// Probes newly registered while queuing insertions
    pub probes_inserted: usize,
    pub probe_insertions: PhaseStats,
    pub ephys_recordings: PopulateReport,
    pub clusterings: PhaseStats,
}

impl IngestReport {
    /// Rows inserted across every table
    pub fn total_inserted(&self) -> usize {
        self.sessions.inserted
            + self.probes_inserted
            + self.probe_insertions.inserted
            + self.ephys_recordings.inserted
            + self.clusterings.inserted
    }

    /// Total per-record skips, populate errors included
    pub fn total_skipped(&self) -> usize {
        self.sessions.skipped
            + self.probe_insertions.skipped
            + self.ephys_recordings.errors.len()
            + self.clusterings.skipped
    }

    pub fn display_string(&self) -> String {
        [
            self.sessions.display_string("sessions"),
            format!("probes: {} inserted", self.probes_inserted),
            self.probe_insertions.display_string("probe_insertions"),
            format!("ephys_recordings: {}", self.ephys_recordings.display_string()),
            self.clusterings.display_string("clusterings"),
        ]
        .join("\n")
    }
}
