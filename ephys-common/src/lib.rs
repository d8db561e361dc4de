//! # Ephys Common Library
//!
//! Shared code for the ephys ingest tools including:
//! - Error type and result alias
//! - Configuration loading and root data directory resolution
//! - Database schema initialization and entity models
//! - Content-derived identifiers for unkeyed entities
//! - Timestamp formatting

pub mod config;
pub mod db;
pub mod error;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use uuid_utils::{derive_id, CompositeKey, KeyValue};
