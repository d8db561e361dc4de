//! Filesystem discovery of sessions and probe insertions
//!
//! Layout convention: `<root>/<subject>/**/<probe dir>/<name>.ap.meta`.
//! Every metadata file under a subject directory belongs to that subject's
//! session; its parent directory name carries the probe ordinal.

use super::file_scanner::FileScanner;
use super::meta_reader::RecordingMeta;
use super::probe_dir::probe_ordinal;
use crate::error::{Outcome, SkipReason};
use ephys_common::config::find_subject_dir;
use ephys_common::db::{Probe, ProbeInsertion, ProbeInsertionKey, Session, SessionKey};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Probe and probe-insertion candidate discovered from one metadata file
#[derive(Debug, Clone, PartialEq)]
pub struct InsertionCandidate {
    pub probe: Probe,
    pub insertion: ProbeInsertion,
    pub meta_path: PathBuf,
}

/// Read-only discovery over the configured root data directories
#[derive(Debug, Clone)]
pub struct Discovery {
    roots: Vec<PathBuf>,
    scanner: FileScanner,
}

impl Discovery {
    pub fn new(roots: Vec<PathBuf>, scanner: FileScanner) -> Self {
        Self { roots, scanner }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Subject directory in the first root that has one
    pub fn subject_dir(&self, subject: &str) -> Option<PathBuf> {
        find_subject_dir(&self.roots, subject)
    }

    /// Sorted metadata files for a subject; empty when the subject has no directory yet
    pub fn meta_files(&self, subject: &str) -> Outcome<Vec<PathBuf>> {
        let Some(dir) = self.subject_dir(subject) else {
            debug!(subject, "No subject directory");
            return Ok(Vec::new());
        };

        self.scanner
            .find_meta_files(&dir)
            .map_err(|e| SkipReason::Scan(e.to_string()))
    }

    /// Candidate session for a subject
    ///
    /// `Ok(None)` means no data yet. When several metadata files exist the
    /// earliest recording time wins; ties go to the first path in sorted order.
    pub fn discover_session(&self, subject: &str) -> Outcome<Option<Session>> {
        let files = self.meta_files(subject)?;
        if files.is_empty() {
            return Ok(None);
        }

        let mut earliest: Option<RecordingMeta> = None;
        let mut first_failure = None;

        for path in &files {
            match read_meta(path) {
                Ok(meta) => {
                    // Files are sorted, so strict `<` keeps the first path on ties
                    if earliest
                        .as_ref()
                        .map_or(true, |e| meta.recording_time < e.recording_time)
                    {
                        earliest = Some(meta);
                    }
                }
                Err(reason) => {
                    warn!(subject, "{}", reason);
                    first_failure.get_or_insert(reason);
                }
            }
        }

        match (earliest, first_failure) {
            (Some(meta), _) => Ok(Some(Session {
                key: SessionKey::new(subject, meta.recording_time),
            })),
            (None, Some(reason)) => Err(reason),
            (None, None) => Ok(None),
        }
    }

    /// Probe-insertion candidates for a session, one outcome per metadata file
    pub fn discover_insertions(&self, session: &SessionKey) -> Vec<Outcome<InsertionCandidate>> {
        let files = match self.meta_files(&session.subject) {
            Ok(files) => files,
            Err(reason) => return vec![Err(reason)],
        };

        let mut seen = HashSet::new();
        files
            .iter()
            .map(|path| {
                let candidate = insertion_candidate(session, path)?;
                let number = candidate.insertion.key.insertion_number;
                if !seen.insert(number) {
                    return Err(SkipReason::DuplicateInsertion {
                        insertion_number: number,
                        path: path.clone(),
                    });
                }
                Ok(candidate)
            })
            .collect()
    }

    /// Metadata file recorded by a stored probe insertion
    ///
    /// Matches on probe ordinal and probe serial number. When no file matches,
    /// the first read failure among files with the right ordinal is returned;
    /// `MissingRecording` means no such file exists at all.
    pub fn find_recording_meta(&self, insertion: &ProbeInsertion) -> Outcome<RecordingMeta> {
        let files = self.meta_files(&insertion.key.subject)?;
        let mut first_failure = None;

        let candidates = files
            .iter()
            .filter(|path| probe_ordinal(path) == Ok(insertion.key.insertion_number));

        for path in candidates {
            match read_meta(path) {
                Ok(meta) if meta.probe_serial == insertion.probe.probe => return Ok(meta),
                Ok(_) => {}
                Err(reason) => {
                    first_failure.get_or_insert(reason);
                }
            }
        }

        Err(first_failure
            .unwrap_or_else(|| SkipReason::MissingRecording(describe_insertion(&insertion.key))))
    }
}

fn read_meta(path: &Path) -> Outcome<RecordingMeta> {
    RecordingMeta::from_file(path).map_err(|e| SkipReason::UnreadableMeta {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn insertion_candidate(session: &SessionKey, path: &Path) -> Outcome<InsertionCandidate> {
    let insertion_number = probe_ordinal(path).map_err(|_| SkipReason::MalformedDirectoryName {
        name: path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        path: path.to_path_buf(),
    })?;

    let meta = read_meta(path)?;
    let probe = Probe::new(meta.probe_model, meta.probe_serial);

    Ok(InsertionCandidate {
        insertion: ProbeInsertion {
            key: ProbeInsertionKey::new(session, insertion_number),
            probe: probe.clone(),
        },
        probe,
        meta_path: path.to_path_buf(),
    })
}

/// Human-readable insertion key for logs and skip reasons
pub fn describe_insertion(key: &ProbeInsertionKey) -> String {
    format!(
        "{} @ {} insertion {}",
        key.subject,
        ephys_common::time::format_datetime(&key.session_datetime),
        key.insertion_number
    )
}
