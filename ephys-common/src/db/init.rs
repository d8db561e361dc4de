//! Database initialization
//!
//! Opens (or creates) the SQLite store and creates the ingest tables if they
//! do not exist. Table creation is idempotent; there are no migrations.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Foreign keys are a per-connection pragma; every pooled connection needs it
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create all ingest tables (idempotent)
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_subject_table(pool).await?;
    create_session_table(pool).await?;
    create_probe_table(pool).await?;
    create_probe_insertion_table(pool).await?;
    create_ephys_recording_table(pool).await?;
    create_clustering_table(pool).await?;

    tracing::debug!("Database tables initialized");
    Ok(())
}

async fn create_subject_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subject (
            subject TEXT PRIMARY KEY,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_session_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS session (
            subject TEXT NOT NULL REFERENCES subject(subject),
            session_datetime TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (subject, session_datetime)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_probe_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS probe (
            probe_type TEXT NOT NULL,
            probe TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (probe_type, probe)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_probe_insertion_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS probe_insertion (
            subject TEXT NOT NULL,
            session_datetime TEXT NOT NULL,
            insertion_number INTEGER NOT NULL CHECK (insertion_number >= 0),
            probe_type TEXT NOT NULL,
            probe TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (subject, session_datetime, insertion_number),
            FOREIGN KEY (subject, session_datetime)
                REFERENCES session(subject, session_datetime),
            FOREIGN KEY (probe_type, probe)
                REFERENCES probe(probe_type, probe)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_ephys_recording_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ephys_recording (
            subject TEXT NOT NULL,
            session_datetime TEXT NOT NULL,
            insertion_number INTEGER NOT NULL,
            acq_software TEXT NOT NULL,
            sampling_rate REAL,
            recording_datetime TEXT NOT NULL,
            recording_duration REAL,
            recording_dir TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (subject, session_datetime, insertion_number),
            FOREIGN KEY (subject, session_datetime, insertion_number)
                REFERENCES probe_insertion(subject, session_datetime, insertion_number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_clustering_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS clustering (
            subject TEXT NOT NULL,
            session_datetime TEXT NOT NULL,
            insertion_number INTEGER NOT NULL,
            clustering_method TEXT NOT NULL,
            clustering_time TEXT NOT NULL,
            quality_control INTEGER NOT NULL CHECK (quality_control IN (0, 1)),
            manual_curation INTEGER NOT NULL CHECK (manual_curation IN (0, 1)),
            clustering_instance TEXT NOT NULL UNIQUE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (
                subject, session_datetime, insertion_number,
                clustering_method, clustering_time, quality_control, manual_curation
            ),
            FOREIGN KEY (subject, session_datetime, insertion_number)
                REFERENCES ephys_recording(subject, session_datetime, insertion_number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
