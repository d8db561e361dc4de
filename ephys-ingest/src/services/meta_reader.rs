//! SpikeGLX metadata reader
//!
//! A `.meta` file is a flat `key=value` text header written next to every
//! binary stream. Keys prefixed with `~` (long-form fields) are read without
//! the tilde. Only the fields the ingest needs are typed and kept.

use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Header timestamp format
const META_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Metadata parsing errors
#[derive(Debug, Error)]
pub enum MetaError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed line {line} in {path}: '{content}'")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("Missing field '{field}' in {path}")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("Invalid value for '{field}' in {path}: '{value}'")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        value: String,
    },
}

/// Typed view of an acquisition metadata header
#[derive(Debug, Clone)]
pub struct RecordingMeta {
    pub path: PathBuf,
    /// Recording start (naive local time)
    pub recording_time: NaiveDateTime,
    pub probe_model: String,
    pub probe_serial: String,
    /// Sampling rate in Hz
    pub sampling_rate: Option<f64>,
    /// Recording length in seconds
    pub duration_secs: Option<f64>,
}

impl RecordingMeta {
    /// Read and parse a metadata file
    pub fn from_file(path: &Path) -> Result<Self, MetaError> {
        let text = std::fs::read_to_string(path).map_err(|source| MetaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parse metadata text; `path` is used for error context only
    pub fn parse(text: &str, path: &Path) -> Result<Self, MetaError> {
        let fields = parse_fields(text, path)?;

        let recording_time = parse_recording_time(&fields, path)?;
        let probe_model = probe_model(&fields, path)?;
        let probe_serial = fields
            .get("imProbeSN")
            .or_else(|| fields.get("imDatPrb_sn"))
            .filter(|sn| !sn.is_empty())
            .cloned()
            .ok_or_else(|| MetaError::MissingField {
                path: path.to_path_buf(),
                field: "imProbeSN",
            })?;

        let sampling_rate = optional_f64(&fields, "imSampRate", path)?;
        let duration_secs = optional_f64(&fields, "fileTimeSecs", path)?;

        Ok(Self {
            path: path.to_path_buf(),
            recording_time,
            probe_model,
            probe_serial,
            sampling_rate,
            duration_secs,
        })
    }

    /// Directory holding the metadata file (the probe directory)
    pub fn probe_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

fn parse_fields(text: &str, path: &Path) -> Result<HashMap<String, String>, MetaError> {
    let mut fields = HashMap::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| MetaError::MalformedLine {
            path: path.to_path_buf(),
            line: index + 1,
            content: line.to_string(),
        })?;

        let key = key.trim().trim_start_matches('~');
        fields.insert(key.to_string(), value.trim().to_string());
    }

    Ok(fields)
}

fn parse_recording_time(
    fields: &HashMap<String, String>,
    path: &Path,
) -> Result<NaiveDateTime, MetaError> {
    // Files rewritten by tools keep the acquisition time in the _original field
    let (field, value) = match fields.get("fileCreateTime_original") {
        Some(value) => ("fileCreateTime_original", value),
        None => (
            "fileCreateTime",
            fields.get("fileCreateTime").ok_or_else(|| MetaError::MissingField {
                path: path.to_path_buf(),
                field: "fileCreateTime",
            })?,
        ),
    };

    NaiveDateTime::parse_from_str(value, META_TIME_FORMAT).map_err(|_| MetaError::InvalidField {
        path: path.to_path_buf(),
        field,
        value: value.clone(),
    })
}

/// Probe model from the probe-type fields
///
/// `imDatPrb_type` is written by 3B/2.0 hardware; 3A headers only carry `imProbeOpt`.
fn probe_model(fields: &HashMap<String, String>, path: &Path) -> Result<String, MetaError> {
    if let Some(value) = fields.get("imDatPrb_type") {
        let probe_type: i64 = value.parse().map_err(|_| MetaError::InvalidField {
            path: path.to_path_buf(),
            field: "imDatPrb_type",
            value: value.clone(),
        })?;

        let model = match probe_type {
            0 => "neuropixels 1.0 - 3B".to_string(),
            21 => "neuropixels 2.0 - SS".to_string(),
            24 => "neuropixels 2.0 - MS".to_string(),
            other => format!("neuropixels (type {})", other),
        };
        return Ok(model);
    }

    if fields.contains_key("imProbeOpt") {
        return Ok("neuropixels 1.0 - 3A".to_string());
    }

    Err(MetaError::MissingField {
        path: path.to_path_buf(),
        field: "imDatPrb_type",
    })
}

fn optional_f64(
    fields: &HashMap<String, String>,
    field: &'static str,
    path: &Path,
) -> Result<Option<f64>, MetaError> {
    match fields.get(field) {
        None => Ok(None),
        Some(value) => value
            .parse::<f64>()
            .map(Some)
            .map_err(|_| MetaError::InvalidField {
                path: path.to_path_buf(),
                field,
                value: value.clone(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const META_3B: &str = "\
acqApLfSy=384,384,1
fileCreateTime=2023-01-01T10:00:00
fileTimeSecs=1205.5
imDatPrb_sn=18194814141
imDatPrb_type=0
imSampRate=30000.0
~imroTbl=(0,384)(0 0 0 500 250 1)
";

    fn parse(text: &str) -> Result<RecordingMeta, MetaError> {
        RecordingMeta::parse(text, Path::new("/data/M1/imec0/x.ap.meta"))
    }

    #[test]
    fn test_parse_3b_header() {
        let meta = parse(META_3B).unwrap();

        assert_eq!(
            meta.recording_time,
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(10, 0, 0).unwrap()
        );
        assert_eq!(meta.probe_model, "neuropixels 1.0 - 3B");
        assert_eq!(meta.probe_serial, "18194814141");
        assert_eq!(meta.sampling_rate, Some(30000.0));
        assert_eq!(meta.duration_secs, Some(1205.5));
        assert_eq!(meta.probe_dir(), Path::new("/data/M1/imec0"));
    }

    #[test]
    fn test_original_create_time_preferred() {
        let text = format!("{}fileCreateTime_original=2022-12-31T23:59:59\n", META_3B);
        let meta = parse(&text).unwrap();
        assert_eq!(
            meta.recording_time,
            NaiveDate::from_ymd_opt(2022, 12, 31).unwrap().and_hms_opt(23, 59, 59).unwrap()
        );
    }

    #[test]
    fn test_3a_probe_model_and_serial() {
        let text = "\
fileCreateTime=2019-05-05T08:30:00
imProbeOpt=3
imProbeSN=SN3A
";
        let meta = parse(text).unwrap();
        assert_eq!(meta.probe_model, "neuropixels 1.0 - 3A");
        assert_eq!(meta.probe_serial, "SN3A");
        assert_eq!(meta.sampling_rate, None);
    }

    #[test]
    fn test_2_0_probe_models() {
        let ss = META_3B.replace("imDatPrb_type=0", "imDatPrb_type=21");
        let ms = META_3B.replace("imDatPrb_type=0", "imDatPrb_type=24");
        let unknown = META_3B.replace("imDatPrb_type=0", "imDatPrb_type=1030");

        assert_eq!(parse(&ss).unwrap().probe_model, "neuropixels 2.0 - SS");
        assert_eq!(parse(&ms).unwrap().probe_model, "neuropixels 2.0 - MS");
        assert_eq!(parse(&unknown).unwrap().probe_model, "neuropixels (type 1030)");
    }

    #[test]
    fn test_missing_create_time() {
        let text = META_3B.replace("fileCreateTime=2023-01-01T10:00:00\n", "");
        assert!(matches!(
            parse(&text),
            Err(MetaError::MissingField { field: "fileCreateTime", .. })
        ));
    }

    #[test]
    fn test_invalid_create_time() {
        let text = META_3B.replace("2023-01-01T10:00:00", "yesterday");
        assert!(matches!(parse(&text), Err(MetaError::InvalidField { .. })));
    }

    #[test]
    fn test_missing_serial() {
        let text = META_3B.replace("imDatPrb_sn=18194814141\n", "");
        assert!(matches!(parse(&text), Err(MetaError::MissingField { .. })));
    }

    #[test]
    fn test_malformed_line() {
        let text = format!("{}garbage without separator\n", META_3B);
        assert!(matches!(
            parse(&text),
            Err(MetaError::MalformedLine { line: 8, .. })
        ));
    }

    #[test]
    fn test_unreadable_file() {
        let result = RecordingMeta::from_file(Path::new("/nonexistent/x.ap.meta"));
        assert!(matches!(result, Err(MetaError::Io { .. })));
    }
}
