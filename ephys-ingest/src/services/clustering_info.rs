//! Spike-sorting output inspection
//!
//! Derives the clustering identity fields from a sort-output directory:
//!
//! - `manual_curation`: `phy.log` records at least one curation action
//! - `quality_control`: `metrics.csv` is present
//! - `creation_time`, first available of:
//!   1. timestamp of the last curation action in `phy.log`
//!   2. modification time of `metrics.csv`
//!   3. modification time of `spike_times.npy`

use chrono::{NaiveDateTime, NaiveTime};
use ephys_common::db::EphysRecording;
use ephys_common::time::system_time_to_local;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PHY_LOG_FILE: &str = "phy.log";
pub const METRICS_FILE: &str = "metrics.csv";
pub const SPIKE_TIMES_FILE: &str = "spike_times.npy";

/// Log messages phy writes when a human edits the clustering
const CURATION_INDICATORS: [&str; 3] = ["Merge clusters", "Split cluster", "Change metadata_group"];

static DATETIME_STAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}").expect("valid regex"));
static TIME_STAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2}:\d{2}:\d{2}").expect("valid regex"));

#[derive(Debug, Error)]
pub enum ClusteringInfoError {
    #[error("Failed to inspect {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No {file} in {dir}")]
    MissingSortOutput { dir: PathBuf, file: &'static str },
}

/// Identity fields of one clustering run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusteringInfo {
    pub creation_time: NaiveDateTime,
    pub manual_curation: bool,
    pub quality_control: bool,
}

/// Locate the sort output for a recording
///
/// Checks `<recording_dir>/<subdir>` then `<recording_dir>` itself; the first
/// directory holding `spike_times.npy` wins.
pub fn resolve_sort_output_dir(recording: &EphysRecording, subdir: &str) -> Option<PathBuf> {
    let mut candidates = Vec::with_capacity(2);
    if !subdir.is_empty() {
        candidates.push(recording.recording_dir.join(subdir));
    }
    candidates.push(recording.recording_dir.clone());

    candidates
        .into_iter()
        .find(|dir| dir.join(SPIKE_TIMES_FILE).is_file())
}

/// Extract creation time, curation and QC status from a sort-output directory
pub fn extract_clustering_info(dir: &Path) -> Result<ClusteringInfo, ClusteringInfoError> {
    let mut creation_time = None;

    // Manual curation
    let phy_log = dir.join(PHY_LOG_FILE);
    let manual_curation = if phy_log.is_file() {
        let content = std::fs::read_to_string(&phy_log).map_err(|source| ClusteringInfoError::Io {
            path: phy_log.clone(),
            source,
        })?;

        match last_curation_line(&content) {
            Some(line) => {
                creation_time = Some(curation_time(line, &phy_log)?);
                true
            }
            None => false,
        }
    } else {
        false
    };

    // Quality control
    let metrics = dir.join(METRICS_FILE);
    let quality_control = metrics.is_file();
    if quality_control && creation_time.is_none() {
        creation_time = Some(modified_time(&metrics)?);
    }

    let creation_time = match creation_time {
        Some(t) => t,
        None => {
            let spike_times = dir.join(SPIKE_TIMES_FILE);
            if !spike_times.is_file() {
                return Err(ClusteringInfoError::MissingSortOutput {
                    dir: dir.to_path_buf(),
                    file: SPIKE_TIMES_FILE,
                });
            }
            modified_time(&spike_times)?
        }
    };

    Ok(ClusteringInfo {
        creation_time,
        manual_curation,
        quality_control,
    })
}

fn last_curation_line(content: &str) -> Option<&str> {
    content
        .lines()
        .filter(|line| CURATION_INDICATORS.iter().any(|ind| line.contains(ind)))
        .last()
}

/// Timestamp of a curation log line
///
/// Full date-time stamp if present; a bare time is combined with the log
/// file's modification date; otherwise the modification time itself.
fn curation_time(line: &str, phy_log: &Path) -> Result<NaiveDateTime, ClusteringInfoError> {
    if let Some(m) = DATETIME_STAMP.find(line) {
        if let Ok(t) = NaiveDateTime::parse_from_str(m.as_str(), "%Y-%m-%d %H:%M:%S") {
            return Ok(t);
        }
    }

    let log_time = modified_time(phy_log)?;
    if let Some(m) = TIME_STAMP.find(line) {
        if let Ok(t) = NaiveTime::parse_from_str(m.as_str(), "%H:%M:%S") {
            return Ok(log_time.date().and_time(t));
        }
    }

    Ok(log_time)
}

fn modified_time(path: &Path) -> Result<NaiveDateTime, ClusteringInfoError> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(system_time_to_local)
        .map_err(|source| ClusteringInfoError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use std::fs;
    use tempfile::TempDir;

    fn sort_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SPIKE_TIMES_FILE), b"\x93NUMPY").unwrap();
        dir
    }

    #[test]
    fn test_uncurated_without_metrics() {
        let dir = sort_dir();
        let info = extract_clustering_info(dir.path()).unwrap();

        assert!(!info.manual_curation);
        assert!(!info.quality_control);
        assert_eq!(info.creation_time.nanosecond(), 0);
    }

    #[test]
    fn test_metrics_marks_quality_control() {
        let dir = sort_dir();
        fs::write(dir.path().join(METRICS_FILE), b"cluster_id,firing_rate\n").unwrap();

        let info = extract_clustering_info(dir.path()).unwrap();
        assert!(info.quality_control);
        assert!(!info.manual_curation);
    }

    #[test]
    fn test_curation_with_full_timestamp() {
        let dir = sort_dir();
        fs::write(
            dir.path().join(PHY_LOG_FILE),
            "2023-01-02 09:00:00.100 [I] gui:  Started phy\n\
             2023-01-02 09:15:30.412 [I] supervisor:  Merge clusters 12, 17 to 301.\n\
             2023-01-02 09:20:01.002 [I] supervisor:  Split cluster 301 into 302, 303.\n\
             2023-01-02 09:30:00.000 [I] gui:  Close phy\n",
        )
        .unwrap();
        fs::write(dir.path().join(METRICS_FILE), b"cluster_id\n").unwrap();

        let info = extract_clustering_info(dir.path()).unwrap();
        assert!(info.manual_curation);
        assert!(info.quality_control);
        assert_eq!(
            info.creation_time,
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap().and_hms_opt(9, 20, 1).unwrap()
        );
    }

    #[test]
    fn test_curation_with_bare_time_uses_log_date() {
        let dir = sort_dir();
        let log = dir.path().join(PHY_LOG_FILE);
        fs::write(
            &log,
            "14:05:09.001 [I] supervisor:  Change metadata_group for clusters 3 to good.\n",
        )
        .unwrap();

        let info = extract_clustering_info(dir.path()).unwrap();
        let log_date = modified_time(&log).unwrap().date();
        assert!(info.manual_curation);
        assert_eq!(info.creation_time, log_date.and_hms_opt(14, 5, 9).unwrap());
    }

    #[test]
    fn test_log_without_curation_actions() {
        let dir = sort_dir();
        fs::write(dir.path().join(PHY_LOG_FILE), "09:00:00.100 [I] gui:  Started phy\n").unwrap();

        let info = extract_clustering_info(dir.path()).unwrap();
        assert!(!info.manual_curation);
    }

    #[test]
    fn test_missing_spike_times() {
        let dir = TempDir::new().unwrap();
        let result = extract_clustering_info(dir.path());
        assert!(matches!(result, Err(ClusteringInfoError::MissingSortOutput { .. })));
    }

    #[test]
    fn test_resolve_prefers_subdir() {
        let probe_dir = TempDir::new().unwrap();
        let ks = probe_dir.path().join("kilosort");
        fs::create_dir(&ks).unwrap();
        fs::write(ks.join(SPIKE_TIMES_FILE), b"").unwrap();
        fs::write(probe_dir.path().join(SPIKE_TIMES_FILE), b"").unwrap();

        let recording = recording_in(probe_dir.path());
        assert_eq!(resolve_sort_output_dir(&recording, "kilosort"), Some(ks));
        assert_eq!(
            resolve_sort_output_dir(&recording, "other"),
            Some(probe_dir.path().to_path_buf())
        );
    }

    #[test]
    fn test_resolve_none_without_output() {
        let probe_dir = TempDir::new().unwrap();
        let recording = recording_in(probe_dir.path());
        assert_eq!(resolve_sort_output_dir(&recording, "kilosort"), None);
    }

    fn recording_in(dir: &Path) -> EphysRecording {
        use ephys_common::db::{ProbeInsertionKey, SessionKey, ACQ_SOFTWARE_SPIKEGLX};

        let session_datetime = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        EphysRecording {
            key: ProbeInsertionKey::new(&SessionKey::new("M1", session_datetime), 0),
            acq_software: ACQ_SOFTWARE_SPIKEGLX.to_string(),
            sampling_rate: Some(30000.0),
            recording_datetime: session_datetime,
            recording_duration: None,
            recording_dir: dir.to_path_buf(),
        }
    }
}
