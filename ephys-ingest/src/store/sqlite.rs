//! SQLite-backed [`Store`]

use super::{InsertOptions, Store};
use async_trait::async_trait;
use ephys_common::db::{init_database, SqlValue, Table};
use ephys_common::Result;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Sqlite, SqlitePool};
use std::collections::BTreeSet;
use std::path::Path;

/// Store over a SQLite connection pool
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database file and its tables
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = init_database(db_path).await?;
        Ok(Self::new(pool))
    }
}

fn insert_sql<T: Table>(options: InsertOptions) -> String {
    let placeholders = vec!["?"; T::COLUMNS.len()].join(", ");
    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::NAME,
        T::COLUMNS.join(", "),
        placeholders
    );

    // Conflict target is the primary key only, so secondary UNIQUE and
    // foreign-key violations still fail the statement.
    if options.skip_duplicates {
        sql.push_str(&format!(
            " ON CONFLICT ({}) DO NOTHING",
            T::KEY_COLUMNS.join(", ")
        ));
    }

    sql
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Integer(i) => query.bind(i),
        SqlValue::Real(f) => query.bind(f),
        SqlValue::Null => query.bind(None::<String>),
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn fetch_keys<T: Table>(&self) -> Result<BTreeSet<T::Key>> {
        let sql = format!("SELECT {} FROM {}", T::KEY_COLUMNS.join(", "), T::NAME);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(T::key_from_row).collect()
    }

    async fn fetch_all<T: Table>(&self) -> Result<Vec<T>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            T::COLUMNS.join(", "),
            T::NAME,
            T::KEY_COLUMNS.join(", ")
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(T::from_row).collect()
    }

    async fn insert<T: Table>(&self, records: &[T], options: InsertOptions) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let sql = insert_sql::<T>(options);
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for record in records {
            let query = record
                .values()
                .into_iter()
                .fold(sqlx::query(&sql), bind_value);
            inserted += query.execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;

        tracing::debug!(
            table = T::NAME,
            submitted = records.len(),
            inserted,
            skip_duplicates = options.skip_duplicates,
            "Insert completed"
        );

        Ok(inserted)
    }
}
