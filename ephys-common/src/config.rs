//! Configuration loading and root data directory resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Application directory name under the platform config/data dirs
pub const APP_DIR_NAME: &str = "ephys-ingest";

/// Environment variable naming the TOML config file
pub const ENV_CONFIG_PATH: &str = "EPHYS_CONFIG";

/// Environment variable holding the root data directories (platform path-list)
pub const ENV_ROOT_DATA_DIR: &str = "EPHYS_ROOT_DATA_DIR";

/// Environment variable holding the database path
pub const ENV_DATABASE: &str = "EPHYS_DATABASE";

/// Logging section of the TOML config
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default tracing filter directive when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Contents of `config.toml`
///
/// All fields are optional so that a partial file only overrides what it names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Roots searched (in order) for `<root>/<subject>/...`
    #[serde(default)]
    pub root_data_dirs: Vec<PathBuf>,
    /// SQLite database file
    pub database: Option<PathBuf>,
    /// Filename suffix of recording-metadata files
    pub meta_suffix: Option<String>,
    /// Spike-sorting method recorded on clustering rows
    pub clustering_method: Option<String>,
    /// Sort-output subdirectory inside each probe directory
    pub sort_output_subdir: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Resolve the TOML config file location
///
/// Explicit path → ENV → `<config_dir>/ephys-ingest/config.toml`.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// Load the TOML config file
///
/// A missing file is not an error: defaults are used and a warning is logged.
/// A file that exists but cannot be parsed is a configuration error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        debug!("No config file location available, using defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file not found: {} (using defaults)", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    debug!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Resolve root data directories
///
/// CLI → ENV (platform path-list, e.g. `a:b` on unix) → TOML. There is no
/// compiled default; without any root the pipeline has nothing to scan.
pub fn resolve_root_data_dirs(
    cli_args: &[PathBuf],
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> Result<Vec<PathBuf>> {
    // Priority 1: Command-line argument
    if !cli_args.is_empty() {
        return Ok(cli_args.to_vec());
    }

    // Priority 2: Environment variable
    if let Some(value) = std::env::var_os(env_var_name) {
        let dirs: Vec<PathBuf> = std::env::split_paths(&value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        if !dirs.is_empty() {
            return Ok(dirs);
        }
    }

    // Priority 3: TOML config file
    if !toml_config.root_data_dirs.is_empty() {
        return Ok(toml_config.root_data_dirs.clone());
    }

    Err(Error::Config(format!(
        "No root data directory configured. Please configure using one of:\n\
         1. Command line: --root-data-dir /path/to/data\n\
         2. Environment: {}=/path/to/data\n\
         3. TOML config: root_data_dirs = [\"/path/to/data\"]",
        env_var_name
    )))
}

/// Resolve the database path: CLI → ENV → TOML → platform default
pub fn resolve_database_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.database {
        return path.clone();
    }

    default_database_path()
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./ephys_data"))
        .join("ephys.db")
}

/// Locate a subject's directory: the first root that contains `<root>/<subject>`
pub fn find_subject_dir(roots: &[PathBuf], subject: &str) -> Option<PathBuf> {
    roots
        .iter()
        .map(|root| root.join(subject))
        .find(|dir| dir.is_dir())
}
