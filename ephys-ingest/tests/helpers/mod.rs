//! Test Helper Utilities
//!
//! Shared utilities for testing ephys-ingest

#![allow(dead_code, unused_imports)]

pub mod fixtures;
pub mod log_capture;

pub use fixtures::{
    create_driver, create_test_store, datetime, meta_text, seed_subjects, write_meta,
    write_sort_output,
};
pub use log_capture::{capture_logs, LogCapture};
