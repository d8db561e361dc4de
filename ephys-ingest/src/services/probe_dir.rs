//! Probe directory name parser
//!
//! Grammar (anchored at the end of the directory name):
//!
//! ```text
//! name    := <anything> [prefix] ordinal
//! prefix  := "imec"
//! ordinal := digit+
//! ```
//!
//! Both conventions normalize to the same integer: `imec1` and `1` are
//! ordinal 1. A name without trailing digits is malformed.

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeDirError {
    #[error("Malformed directory name '{0}': expected a trailing probe number")]
    MalformedDirectoryName(String),
}

/// Parse a probe ordinal from a directory name
pub fn parse_probe_dir_name(name: &str) -> Result<u32, ProbeDirError> {
    let digit_count = name.bytes().rev().take_while(u8::is_ascii_digit).count();
    if digit_count == 0 {
        return Err(ProbeDirError::MalformedDirectoryName(name.to_string()));
    }

    // Trailing ASCII digits are single bytes, so this is a char boundary
    name[name.len() - digit_count..]
        .parse::<u32>()
        .map_err(|_| ProbeDirError::MalformedDirectoryName(name.to_string()))
}

/// Parse the ordinal of the directory containing a metadata file
pub fn probe_ordinal(meta_path: &Path) -> Result<u32, ProbeDirError> {
    let name = meta_path
        .parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    parse_probe_dir_name(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_conventions_normalize() {
        assert_eq!(parse_probe_dir_name("imec1"), Ok(1));
        assert_eq!(parse_probe_dir_name("1"), Ok(1));
    }

    #[test]
    fn test_spikeglx_run_directory() {
        assert_eq!(parse_probe_dir_name("M1_2023-01-01_g0_imec0"), Ok(0));
    }

    #[test]
    fn test_multi_digit_ordinal() {
        assert_eq!(parse_probe_dir_name("imec12"), Ok(12));
        assert_eq!(parse_probe_dir_name("probe07"), Ok(7));
    }

    #[test]
    fn test_no_trailing_digit_is_malformed() {
        assert_eq!(
            parse_probe_dir_name("probeA"),
            Err(ProbeDirError::MalformedDirectoryName("probeA".to_string()))
        );
        assert!(parse_probe_dir_name("imec").is_err());
        assert!(parse_probe_dir_name("").is_err());
        assert!(parse_probe_dir_name("imec1a").is_err());
    }

    #[test]
    fn test_overflow_is_malformed() {
        assert!(parse_probe_dir_name("imec99999999999").is_err());
    }

    #[test]
    fn test_non_ascii_prefix() {
        assert_eq!(parse_probe_dir_name("sonde_é3"), Ok(3));
    }

    #[test]
    fn test_probe_ordinal_uses_parent_directory() {
        let meta = Path::new("/data/M1/run_g0/run_g0_imec1/run_g0_t0.imec1.ap.meta");
        assert_eq!(probe_ordinal(meta), Ok(1));

        assert!(probe_ordinal(Path::new("/data/M1/probeA/x.ap.meta")).is_err());
        assert!(probe_ordinal(Path::new("x.ap.meta")).is_err());
    }
}
