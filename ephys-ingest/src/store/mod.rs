//! Persistence adapter
//!
//! The ingest driver talks to the relational store only through [`Store`],
//! so the store handle is injected rather than held as ambient state.
//!
//! Insert semantics: with `skip_duplicates`, a record whose primary key is
//! already stored is a no-op. Every other constraint failure (foreign key,
//! secondary uniqueness, checks) is returned as an error and is fatal for the
//! batch.

pub mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use ephys_common::db::Table;
use ephys_common::Result;
use std::collections::BTreeSet;

/// Insert behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOptions {
    /// Treat primary-key collisions as no-ops
    pub skip_duplicates: bool,
}

impl InsertOptions {
    pub fn skip_duplicates() -> Self {
        Self {
            skip_duplicates: true,
        }
    }

    pub fn strict() -> Self {
        Self::default()
    }
}

/// Relational store consumed by the ingest pipeline
#[async_trait]
pub trait Store: Send + Sync {
    /// Keys of every stored record of `T`
    async fn fetch_keys<T: Table>(&self) -> Result<BTreeSet<T::Key>>;

    /// Every stored record of `T`, ordered by key
    async fn fetch_all<T: Table>(&self) -> Result<Vec<T>>;

    /// Insert records in one transaction; returns the number of rows actually inserted
    async fn insert<T: Table>(&self, records: &[T], options: InsertOptions) -> Result<u64>;

    /// Insert a single record
    async fn insert_one<T: Table>(&self, record: &T, options: InsertOptions) -> Result<u64> {
        self.insert(std::slice::from_ref(record), options).await
    }
}
