//! Phase 2: PROBE INSERTIONS
//!
//! Probes are registered lazily, one at a time, before the insertion that
//! references them is queued; insertions are then inserted as one batch.

use super::{record_skip, IngestDriver, PhaseStats};
use crate::error::IngestResult;
use crate::services::discovery::describe_insertion;
use crate::store::{InsertOptions, Store};
use ephys_common::db::{ProbeInsertion, Session};
use tracing::{debug, info};

impl<S: Store> IngestDriver<S> {
    /// Phase 2: PROBE INSERTIONS - register new insertions for every session
    ///
    /// # Returns
    /// Phase statistics and the number of newly registered probes
    pub(super) async fn phase_insertions(&self) -> IngestResult<(PhaseStats, usize)> {
        let sessions = self.store.fetch_keys::<Session>().await?;
        let existing = self.store.fetch_keys::<ProbeInsertion>().await?;

        let mut stats = PhaseStats::default();
        let mut probes_inserted = 0usize;
        let mut insertions = Vec::new();

        for session in &sessions {
            for outcome in self.discovery.discover_insertions(session) {
                let candidate = match outcome {
                    Ok(candidate) => candidate,
                    Err(reason) => {
                        record_skip(&mut stats, "probe_insertions", &reason);
                        continue;
                    }
                };
                stats.discovered += 1;

                if existing.contains(&candidate.insertion.key) {
                    debug!(
                        insertion = %describe_insertion(&candidate.insertion.key),
                        "Already registered"
                    );
                    stats.already_present += 1;
                    continue;
                }

                probes_inserted += self
                    .store
                    .insert_one(&candidate.probe, InsertOptions::skip_duplicates())
                    .await? as usize;

                debug!(
                    insertion = %describe_insertion(&candidate.insertion.key),
                    meta = %candidate.meta_path.display(),
                    "Queued new insertion"
                );
                insertions.push(candidate.insertion);
            }
        }

        println!("Inserting {} probe_insertion(s)", insertions.len());
        info!(count = insertions.len(), probes_inserted, "Inserting probe insertions");

        stats.inserted = self
            .store
            .insert(&insertions, InsertOptions::skip_duplicates())
            .await? as usize;

        Ok((stats, probes_inserted))
    }
}
