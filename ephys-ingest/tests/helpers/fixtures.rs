//! Data tree and database fixtures
//!
//! Layout written: `<root>/<subject>/<session dir>/<probe dir>/<name>.ap.meta`,
//! with optional sort output under `<probe dir>/kilosort/`.

use chrono::{NaiveDate, NaiveDateTime};
use ephys_common::db::Subject;
use ephys_ingest::{IngestConfig, IngestDriver, InsertOptions, SqliteStore, Store};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn datetime(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

/// SpikeGLX-style header for a 3B probe
pub fn meta_text(create_time: &str, serial: &str) -> String {
    format!(
        "acqApLfSy=384,384,1\n\
         fileCreateTime={create_time}\n\
         fileSizeBytes=1152000\n\
         fileTimeSecs=600.5\n\
         imDatPrb_type=0\n\
         imDatPrb_sn={serial}\n\
         imSampRate=30000\n\
         nSavedChans=385\n\
         typeThis=imec\n\
         ~snsShankMap=(1,2,480)(0:0:0:1)\n"
    )
}

/// Write a metadata file, creating parent directories
pub fn write_meta(
    root: &Path,
    subject: &str,
    probe_dir: &str,
    create_time: &str,
    serial: &str,
) -> PathBuf {
    let dir = root.join(subject).join(format!("{subject}_g0")).join(probe_dir);
    fs::create_dir_all(&dir).unwrap();

    let path = dir.join(format!("{subject}_g0_t0.{probe_dir}.ap.meta"));
    fs::write(&path, meta_text(create_time, serial)).unwrap();
    path
}

/// Write a curated, quality-controlled sort output next to a metadata file
///
/// The last curation action is stamped 2023-01-02 09:20:01.
pub fn write_sort_output(meta_path: &Path) -> PathBuf {
    let dir = meta_path.parent().unwrap().join("kilosort");
    fs::create_dir_all(&dir).unwrap();

    fs::write(dir.join("spike_times.npy"), b"\x93NUMPY").unwrap();
    fs::write(dir.join("metrics.csv"), "cluster_id,firing_rate\n0,1.5\n").unwrap();
    fs::write(
        dir.join("phy.log"),
        "2023-01-02 09:15:30.412 [I] supervisor:  Merge clusters 12, 17 to 301.\n\
         2023-01-02 09:20:01.002 [I] supervisor:  Change metadata_group for clusters 301 to good.\n",
    )
    .unwrap();
    dir
}

/// File-backed store in its own temp directory
///
/// Returns (TempDir, SqliteStore); the TempDir must outlive the store.
pub async fn create_test_store() -> (TempDir, SqliteStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteStore::open(&temp_dir.path().join("ephys.db"))
        .await
        .unwrap();
    (temp_dir, store)
}

pub async fn seed_subjects(store: &SqliteStore, subjects: &[&str]) {
    let subjects: Vec<Subject> = subjects.iter().copied().map(Subject::new).collect();
    store
        .insert(&subjects, InsertOptions::strict())
        .await
        .unwrap();
}

pub fn create_driver(store: &SqliteStore, root: &Path) -> IngestDriver<SqliteStore> {
    IngestDriver::new(store.clone(), IngestConfig::new(vec![root.to_path_buf()]))
}
