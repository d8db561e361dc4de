//! Database models
//!
//! Entities are identified by composite natural keys. Records are append-only:
//! once a key is stored the pipeline never updates or removes it.

use super::table::{SqlValue, Table};
use crate::time::{format_datetime, parse_datetime};
use crate::uuid_utils::{derive_id, CompositeKey};
use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::path::PathBuf;
use uuid::Uuid;

/// Acquisition software recorded on every ephys recording
pub const ACQ_SOFTWARE_SPIKEGLX: &str = "SpikeGLX";

fn get_datetime(row: &SqliteRow, column: &str) -> Result<NaiveDateTime> {
    let value: String = row.try_get(column)?;
    parse_datetime(&value)
}

fn get_insertion_number(row: &SqliteRow) -> Result<u32> {
    let value: i64 = row.try_get("insertion_number")?;
    u32::try_from(value)
        .map_err(|_| Error::InvalidInput(format!("Invalid insertion_number {}", value)))
}

/// Experimental subject (registered externally)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub subject: String,
}

impl Subject {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

impl Table for Subject {
    type Key = String;

    const NAME: &'static str = "subject";
    const COLUMNS: &'static [&'static str] = &["subject"];
    const KEY_COLUMNS: &'static [&'static str] = &["subject"];

    fn key(&self) -> String {
        self.subject.clone()
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![SqlValue::Text(self.subject.clone())]
    }

    fn key_from_row(row: &SqliteRow) -> Result<String> {
        Ok(row.try_get("subject")?)
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            subject: row.try_get("subject")?,
        })
    }
}

/// One recording day/run for a subject
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub subject: String,
    pub session_datetime: NaiveDateTime,
}

impl SessionKey {
    pub fn new(subject: impl Into<String>, session_datetime: NaiveDateTime) -> Self {
        Self {
            subject: subject.into(),
            session_datetime,
        }
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            subject: row.try_get("subject")?,
            session_datetime: get_datetime(row, "session_datetime")?,
        })
    }
}

/// Session record (the key is the whole record)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub key: SessionKey,
}

impl Table for Session {
    type Key = SessionKey;

    const NAME: &'static str = "session";
    const COLUMNS: &'static [&'static str] = &["subject", "session_datetime"];
    const KEY_COLUMNS: &'static [&'static str] = &["subject", "session_datetime"];

    fn key(&self) -> SessionKey {
        self.key.clone()
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.key.subject.clone()),
            SqlValue::Text(format_datetime(&self.key.session_datetime)),
        ]
    }

    fn key_from_row(row: &SqliteRow) -> Result<SessionKey> {
        SessionKey::from_row(row)
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            key: SessionKey::from_row(row)?,
        })
    }
}

/// Physical probe device, keyed by model and serial number
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Probe {
    pub probe_type: String,
    /// Serial number
    pub probe: String,
}

impl Probe {
    pub fn new(probe_type: impl Into<String>, probe: impl Into<String>) -> Self {
        Self {
            probe_type: probe_type.into(),
            probe: probe.into(),
        }
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            probe_type: row.try_get("probe_type")?,
            probe: row.try_get("probe")?,
        })
    }
}

impl Table for Probe {
    type Key = Probe;

    const NAME: &'static str = "probe";
    const COLUMNS: &'static [&'static str] = &["probe_type", "probe"];
    const KEY_COLUMNS: &'static [&'static str] = &["probe_type", "probe"];

    fn key(&self) -> Probe {
        self.clone()
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.probe_type.clone()),
            SqlValue::Text(self.probe.clone()),
        ]
    }

    fn key_from_row(row: &SqliteRow) -> Result<Probe> {
        Probe::from_row(row)
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Probe::from_row(row)
    }
}

/// Key shared by probe insertions and the recordings derived from them
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProbeInsertionKey {
    pub subject: String,
    pub session_datetime: NaiveDateTime,
    pub insertion_number: u32,
}

impl ProbeInsertionKey {
    pub fn new(session: &SessionKey, insertion_number: u32) -> Self {
        Self {
            subject: session.subject.clone(),
            session_datetime: session.session_datetime,
            insertion_number,
        }
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            subject: row.try_get("subject")?,
            session_datetime: get_datetime(row, "session_datetime")?,
            insertion_number: get_insertion_number(row)?,
        })
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.subject.clone()),
            SqlValue::Text(format_datetime(&self.session_datetime)),
            SqlValue::Integer(i64::from(self.insertion_number)),
        ]
    }
}

/// One probe placed into one session at one position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeInsertion {
    pub key: ProbeInsertionKey,
    pub probe: Probe,
}

impl Table for ProbeInsertion {
    type Key = ProbeInsertionKey;

    const NAME: &'static str = "probe_insertion";
    const COLUMNS: &'static [&'static str] = &[
        "subject",
        "session_datetime",
        "insertion_number",
        "probe_type",
        "probe",
    ];
    const KEY_COLUMNS: &'static [&'static str] =
        &["subject", "session_datetime", "insertion_number"];

    fn key(&self) -> ProbeInsertionKey {
        self.key.clone()
    }

    fn values(&self) -> Vec<SqlValue> {
        let mut values = self.key.values();
        values.push(SqlValue::Text(self.probe.probe_type.clone()));
        values.push(SqlValue::Text(self.probe.probe.clone()));
        values
    }

    fn key_from_row(row: &SqliteRow) -> Result<ProbeInsertionKey> {
        ProbeInsertionKey::from_row(row)
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            key: ProbeInsertionKey::from_row(row)?,
            probe: Probe::from_row(row)?,
        })
    }
}

/// Processed recording for one probe insertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphysRecording {
    pub key: ProbeInsertionKey,
    pub acq_software: String,
    /// Sampling rate in Hz
    pub sampling_rate: Option<f64>,
    pub recording_datetime: NaiveDateTime,
    /// Duration in seconds
    pub recording_duration: Option<f64>,
    /// Directory holding the acquisition metadata file
    pub recording_dir: PathBuf,
}

impl Table for EphysRecording {
    type Key = ProbeInsertionKey;

    const NAME: &'static str = "ephys_recording";
    const COLUMNS: &'static [&'static str] = &[
        "subject",
        "session_datetime",
        "insertion_number",
        "acq_software",
        "sampling_rate",
        "recording_datetime",
        "recording_duration",
        "recording_dir",
    ];
    const KEY_COLUMNS: &'static [&'static str] =
        &["subject", "session_datetime", "insertion_number"];

    fn key(&self) -> ProbeInsertionKey {
        self.key.clone()
    }

    fn values(&self) -> Vec<SqlValue> {
        let mut values = self.key.values();
        values.push(SqlValue::Text(self.acq_software.clone()));
        values.push(self.sampling_rate.into());
        values.push(SqlValue::Text(format_datetime(&self.recording_datetime)));
        values.push(self.recording_duration.into());
        values.push(SqlValue::Text(self.recording_dir.to_string_lossy().to_string()));
        values
    }

    fn key_from_row(row: &SqliteRow) -> Result<ProbeInsertionKey> {
        ProbeInsertionKey::from_row(row)
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        let recording_dir: String = row.try_get("recording_dir")?;
        Ok(Self {
            key: ProbeInsertionKey::from_row(row)?,
            acq_software: row.try_get("acq_software")?,
            sampling_rate: row.try_get("sampling_rate")?,
            recording_datetime: get_datetime(row, "recording_datetime")?,
            recording_duration: row.try_get("recording_duration")?,
            recording_dir: PathBuf::from(recording_dir),
        })
    }
}

/// Natural key of one spike-sorting run
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClusteringKey {
    pub recording: ProbeInsertionKey,
    pub clustering_method: String,
    pub clustering_time: NaiveDateTime,
    /// Quality-control metrics were computed
    pub quality_control: bool,
    /// A human reviewed the result
    pub manual_curation: bool,
}

impl ClusteringKey {
    /// Field-name → value view of the full key, used for identity hashing
    pub fn composite_key(&self) -> CompositeKey {
        CompositeKey::new()
            .with("subject", self.recording.subject.as_str())
            .with("session_datetime", self.recording.session_datetime)
            .with("insertion_number", self.recording.insertion_number)
            .with("clustering_method", self.clustering_method.as_str())
            .with("clustering_time", self.clustering_time)
            .with("quality_control", self.quality_control)
            .with("manual_curation", self.manual_curation)
    }

    /// Content-derived clustering identity
    pub fn instance_id(&self) -> Uuid {
        derive_id(&self.composite_key())
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        let quality_control: i64 = row.try_get("quality_control")?;
        let manual_curation: i64 = row.try_get("manual_curation")?;
        Ok(Self {
            recording: ProbeInsertionKey::from_row(row)?,
            clustering_method: row.try_get("clustering_method")?,
            clustering_time: get_datetime(row, "clustering_time")?,
            quality_control: quality_control != 0,
            manual_curation: manual_curation != 0,
        })
    }
}

/// Clustering record: key plus its derived instance identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clustering {
    pub key: ClusteringKey,
    pub clustering_instance: Uuid,
}

impl Clustering {
    /// Build a clustering record, deriving its instance id from the key
    pub fn from_key(key: ClusteringKey) -> Self {
        let clustering_instance = key.instance_id();
        Self {
            key,
            clustering_instance,
        }
    }
}

impl Table for Clustering {
    type Key = ClusteringKey;

    const NAME: &'static str = "clustering";
    const COLUMNS: &'static [&'static str] = &[
        "subject",
        "session_datetime",
        "insertion_number",
        "clustering_method",
        "clustering_time",
        "quality_control",
        "manual_curation",
        "clustering_instance",
    ];
    const KEY_COLUMNS: &'static [&'static str] = &[
        "subject",
        "session_datetime",
        "insertion_number",
        "clustering_method",
        "clustering_time",
        "quality_control",
        "manual_curation",
    ];

    fn key(&self) -> ClusteringKey {
        self.key.clone()
    }

    fn values(&self) -> Vec<SqlValue> {
        let mut values = self.key.recording.values();
        values.push(SqlValue::Text(self.key.clustering_method.clone()));
        values.push(SqlValue::Text(format_datetime(&self.key.clustering_time)));
        values.push(self.key.quality_control.into());
        values.push(self.key.manual_curation.into());
        values.push(SqlValue::Text(self.clustering_instance.to_string()));
        values
    }

    fn key_from_row(row: &SqliteRow) -> Result<ClusteringKey> {
        ClusteringKey::from_row(row)
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        let instance: String = row.try_get("clustering_instance")?;
        let clustering_instance = Uuid::parse_str(&instance)
            .map_err(|e| Error::InvalidInput(format!("Invalid UUID in database: {}", e)))?;
        Ok(Self {
            key: ClusteringKey::from_row(row)?,
            clustering_instance,
        })
    }
}
