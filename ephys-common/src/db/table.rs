//! Table descriptors
//!
//! Each persisted entity describes its own table so the persistence layer can
//! build `INSERT`/`SELECT` statements generically. `COLUMNS` must list the
//! key columns first, in the same order as `KEY_COLUMNS`.

use crate::Result;
use sqlx::sqlite::SqliteRow;
use std::fmt::Debug;

/// Value bound into an INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Null,
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Integer(i64::from(value))
    }
}

impl From<Option<f64>> for SqlValue {
    fn from(value: Option<f64>) -> Self {
        value.map(SqlValue::Real).unwrap_or(SqlValue::Null)
    }
}

/// Persisted entity
pub trait Table: Sized + Send + Sync + Unpin + 'static {
    /// Natural (primary) key
    type Key: Ord + Clone + Debug + Send + Sync;

    /// Table name
    const NAME: &'static str;
    /// All inserted columns, key columns first
    const COLUMNS: &'static [&'static str];
    /// Primary key columns
    const KEY_COLUMNS: &'static [&'static str];

    fn key(&self) -> Self::Key;

    /// Column values in `COLUMNS` order
    fn values(&self) -> Vec<SqlValue>;

    /// Decode the key from a row that contains at least `KEY_COLUMNS`
    fn key_from_row(row: &SqliteRow) -> Result<Self::Key>;

    /// Decode a full record from a row that contains `COLUMNS`
    fn from_row(row: &SqliteRow) -> Result<Self>;
}
