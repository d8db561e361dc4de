//! EphysRecording populate step
//!
//! Computes one recording per probe insertion that has none yet. Each item is
//! made and inserted on its own, so one failing recording never blocks the
//! others when errors are suppressed.

use super::discovery::{describe_insertion, Discovery};
use crate::error::{IngestError, IngestResult, Outcome};
use crate::store::{InsertOptions, Store};
use ephys_common::db::{EphysRecording, ProbeInsertion, ProbeInsertionKey, ACQ_SOFTWARE_SPIKEGLX};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Populate statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct PopulateReport {
    /// Probe insertions without a recording at start
    pub pending: usize,
    /// Recordings inserted
    pub inserted: usize,
    /// Suppressed per-item failures
    pub errors: Vec<(ProbeInsertionKey, String)>,
}

impl PopulateReport {
    pub fn display_string(&self) -> String {
        format!(
            "{} of {} pending recording(s) populated, {} error(s)",
            self.inserted,
            self.pending,
            self.errors.len()
        )
    }
}

/// Build the recording for one probe insertion from its metadata file
pub fn make(discovery: &Discovery, insertion: &ProbeInsertion) -> Outcome<EphysRecording> {
    let meta = discovery.find_recording_meta(insertion)?;

    Ok(EphysRecording {
        key: insertion.key.clone(),
        acq_software: ACQ_SOFTWARE_SPIKEGLX.to_string(),
        sampling_rate: meta.sampling_rate,
        recording_datetime: meta.recording_time,
        recording_duration: meta.duration_secs,
        recording_dir: meta.probe_dir().to_path_buf(),
    })
}

/// Populate recordings for every probe insertion that lacks one
///
/// With `suppress_errors` each failure (make or insert) is logged and
/// collected; otherwise the first failure aborts the step.
pub async fn populate<S: Store>(
    store: &S,
    discovery: &Discovery,
    suppress_errors: bool,
) -> IngestResult<PopulateReport> {
    let done = store.fetch_keys::<EphysRecording>().await?;
    let pending: Vec<ProbeInsertion> = store
        .fetch_all::<ProbeInsertion>()
        .await?
        .into_iter()
        .filter(|insertion| !done.contains(&insertion.key))
        .collect();

    let mut report = PopulateReport {
        pending: pending.len(),
        ..Default::default()
    };

    for insertion in &pending {
        let result = match make(discovery, insertion) {
            Ok(recording) => store
                .insert_one(&recording, InsertOptions::skip_duplicates())
                .await
                .map_err(|e| e.to_string()),
            Err(reason) => Err(reason.to_string()),
        };

        match result {
            Ok(inserted) => {
                debug!(insertion = %describe_insertion(&insertion.key), "Recording populated");
                report.inserted += inserted as usize;
            }
            Err(reason) if suppress_errors => {
                warn!(
                    insertion = %describe_insertion(&insertion.key),
                    error = %reason,
                    "Recording populate failed, continuing"
                );
                report.errors.push((insertion.key.clone(), reason));
            }
            Err(reason) => {
                error!(
                    insertion = %describe_insertion(&insertion.key),
                    error = %reason,
                    "Recording populate failed"
                );
                return Err(IngestError::Populate {
                    key: describe_insertion(&insertion.key),
                    reason,
                });
            }
        }
    }

    info!("{}", report.display_string());
    Ok(report)
}
