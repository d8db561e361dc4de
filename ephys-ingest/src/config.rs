//! Configuration resolution for ephys-ingest
//!
//! Provides multi-tier configuration resolution with CLI → ENV → TOML → default
//! priority, on top of the shared loaders in `ephys_common::config`.

use crate::services::DEFAULT_META_SUFFIX;
use ephys_common::config::{resolve_root_data_dirs, TomlConfig, ENV_ROOT_DATA_DIR};
use ephys_common::Result;
use std::path::PathBuf;
use tracing::info;

/// Environment variable overriding the clustering method
pub const ENV_CLUSTERING_METHOD: &str = "EPHYS_CLUSTERING_METHOD";

pub const DEFAULT_CLUSTERING_METHOD: &str = "kilosort";
pub const DEFAULT_SORT_OUTPUT_SUBDIR: &str = "kilosort";

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_data_dirs: Vec<PathBuf>,
    pub clustering_method: Option<String>,
}

/// Resolved ingest settings
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    /// Roots searched (in order) for subject directories
    pub root_data_dirs: Vec<PathBuf>,
    /// Filename suffix of recording-metadata files
    pub meta_suffix: String,
    /// Method recorded on every clustering row
    pub clustering_method: String,
    /// Sort-output subdirectory inside each probe directory
    pub sort_output_subdir: String,
}

impl IngestConfig {
    /// Config with compiled defaults for everything but the roots
    pub fn new(root_data_dirs: Vec<PathBuf>) -> Self {
        Self {
            root_data_dirs,
            meta_suffix: DEFAULT_META_SUFFIX.to_string(),
            clustering_method: DEFAULT_CLUSTERING_METHOD.to_string(),
            sort_output_subdir: DEFAULT_SORT_OUTPUT_SUBDIR.to_string(),
        }
    }

    /// Resolve every setting from CLI, environment and TOML
    pub fn resolve(cli: &CliOverrides, toml_config: &TomlConfig) -> Result<Self> {
        let root_data_dirs =
            resolve_root_data_dirs(&cli.root_data_dirs, ENV_ROOT_DATA_DIR, toml_config)?;

        let clustering_method = cli
            .clustering_method
            .clone()
            .or_else(|| std::env::var(ENV_CLUSTERING_METHOD).ok())
            .filter(|m| !m.trim().is_empty())
            .or_else(|| toml_config.clustering_method.clone())
            .unwrap_or_else(|| DEFAULT_CLUSTERING_METHOD.to_string());

        let config = Self {
            root_data_dirs,
            meta_suffix: toml_config
                .meta_suffix
                .clone()
                .unwrap_or_else(|| DEFAULT_META_SUFFIX.to_string()),
            clustering_method,
            sort_output_subdir: toml_config
                .sort_output_subdir
                .clone()
                .unwrap_or_else(|| DEFAULT_SORT_OUTPUT_SUBDIR.to_string()),
        };

        info!(
            roots = ?config.root_data_dirs,
            clustering_method = %config.clustering_method,
            "Ingest configuration resolved"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults_fill_unset_values() {
        std::env::remove_var(ENV_CLUSTERING_METHOD);
        let cli = CliOverrides {
            root_data_dirs: vec![PathBuf::from("/data")],
            clustering_method: None,
        };

        let config = IngestConfig::resolve(&cli, &TomlConfig::default()).unwrap();
        assert_eq!(config, IngestConfig::new(vec![PathBuf::from("/data")]));
    }

    #[test]
    #[serial]
    fn test_clustering_method_priority() {
        let toml = TomlConfig {
            root_data_dirs: vec![PathBuf::from("/data")],
            clustering_method: Some("kilosort2".to_string()),
            ..Default::default()
        };

        std::env::remove_var(ENV_CLUSTERING_METHOD);
        let from_toml = IngestConfig::resolve(&CliOverrides::default(), &toml).unwrap();
        assert_eq!(from_toml.clustering_method, "kilosort2");

        std::env::set_var(ENV_CLUSTERING_METHOD, "kilosort2.5");
        let from_env = IngestConfig::resolve(&CliOverrides::default(), &toml).unwrap();
        assert_eq!(from_env.clustering_method, "kilosort2.5");

        let cli = CliOverrides {
            clustering_method: Some("kilosort3".to_string()),
            ..Default::default()
        };
        let from_cli = IngestConfig::resolve(&cli, &toml).unwrap();
        assert_eq!(from_cli.clustering_method, "kilosort3");
        std::env::remove_var(ENV_CLUSTERING_METHOD);
    }
}
