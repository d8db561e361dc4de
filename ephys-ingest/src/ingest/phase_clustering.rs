//! Phase 3: CLUSTERINGS
//!
//! Populates missing recordings first (errors suppressed), then derives one
//! clustering per recording from its sort output.

use super::{record_skip, IngestDriver, PhaseStats};
use crate::error::{IngestResult, Outcome, SkipReason};
use crate::services::{extract_clustering_info, populate, resolve_sort_output_dir, PopulateReport};
use crate::store::{InsertOptions, Store};
use ephys_common::db::{Clustering, ClusteringKey, EphysRecording};
use tracing::{debug, info};

impl<S: Store> IngestDriver<S> {
    /// Phase 3: CLUSTERINGS - populate recordings, then register their clusterings
    pub(super) async fn phase_clustering(&self) -> IngestResult<(PopulateReport, PhaseStats)> {
        let recordings_report = populate(&self.store, &self.discovery, true).await?;

        let existing = self.store.fetch_keys::<Clustering>().await?;
        let recordings = self.store.fetch_all::<EphysRecording>().await?;

        let mut stats = PhaseStats::default();
        let mut clusterings = Vec::new();

        for recording in &recordings {
            let key = match self.clustering_key(recording) {
                Ok(key) => key,
                Err(reason) => {
                    record_skip(&mut stats, "clusterings", &reason);
                    continue;
                }
            };
            stats.discovered += 1;

            if existing.contains(&key) {
                debug!(subject = %key.recording.subject, "Clustering already registered");
                stats.already_present += 1;
                continue;
            }

            clusterings.push(Clustering::from_key(key));
        }

        println!("Inserting {} clustering(s)", clusterings.len());
        info!(count = clusterings.len(), "Inserting clusterings");

        stats.inserted = self
            .store
            .insert(&clusterings, InsertOptions::skip_duplicates())
            .await? as usize;

        Ok((recordings_report, stats))
    }

    fn clustering_key(&self, recording: &EphysRecording) -> Outcome<ClusteringKey> {
        let dir = resolve_sort_output_dir(recording, &self.config.sort_output_subdir)
            .ok_or_else(|| SkipReason::MissingSortOutput(recording.recording_dir.clone()))?;

        let info =
            extract_clustering_info(&dir).map_err(|e| SkipReason::ClusteringInfo(e.to_string()))?;

        Ok(ClusteringKey {
            recording: recording.key.clone(),
            clustering_method: self.config.clustering_method.clone(),
            clustering_time: info.creation_time,
            quality_control: info.quality_control,
            manual_curation: info.manual_curation,
        })
    }
}
