//! Tests for database initialization
//!
//! - Database file is created on first run
//! - Re-opening an existing database is safe (idempotent table creation)
//! - Foreign keys are enforced on every pooled connection

use ephys_common::db::init::init_database;
use tempfile::TempDir;

const INGEST_TABLES: [&str; 6] = [
    "clustering",
    "ephys_recording",
    "probe",
    "probe_insertion",
    "session",
    "subject",
];

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("ephys.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("ephys.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());
    drop(pool1);

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_all_tables_created() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("ephys.db")).await.unwrap();

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(tables, INGEST_TABLES);
}

#[tokio::test]
async fn test_foreign_keys_enforced() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("ephys.db")).await.unwrap();

    // Session for an unregistered subject must be rejected
    let result = sqlx::query(
        "INSERT INTO session (subject, session_datetime) VALUES ('ghost', '2023-01-01 10:00:00')",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "Foreign key violation was not reported");
}

#[tokio::test]
async fn test_negative_insertion_number_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("ephys.db")).await.unwrap();

    sqlx::query("INSERT INTO subject (subject) VALUES ('M1')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO session (subject, session_datetime) VALUES ('M1', '2023-01-01 10:00:00')",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO probe (probe_type, probe) VALUES ('neuropixels 1.0 - 3B', 'SN1')")
        .execute(&pool)
        .await
        .unwrap();

    let result = sqlx::query(
        "INSERT INTO probe_insertion (subject, session_datetime, insertion_number, probe_type, probe) \
         VALUES ('M1', '2023-01-01 10:00:00', -1, 'neuropixels 1.0 - 3B', 'SN1')",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "Negative insertion number was accepted");
}

#[cfg(unix)]
#[tokio::test]
async fn test_database_path_with_url_characters() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("run #1?mode=ro%20.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created at the literal path");
    assert!(!temp_dir.path().join("run ").exists(), "Path was cut at '#'");
}
