//! SQLite Backend

use crate::{Reading, ReadingStore, StorageError};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS noise_data (
    device_id TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    location  TEXT NOT NULL,
    avg_db    REAL NOT NULL,
    max_db    REAL NOT NULL,
    battery   REAL NOT NULL
)";

const INSERT_READING: &str = "INSERT INTO noise_data
    (device_id, timestamp, location, avg_db, max_db, battery)
    VALUES (?, ?, ?, ?, ?, ?)";

/// Reading store backed by a local SQLite file
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file and ensure the `noise_data` table exists
    pub async fn connect(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| {
                StorageError::Unavailable(format!("cannot open {}: {}", db_path.display(), e))
            })?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;

        info!("SQLite store ready at {}", db_path.display());
        Ok(Self { pool })
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ReadingStore for SqliteStore {
    async fn save_reading(&self, reading: Reading) -> Result<(), StorageError> {
        sqlx::query(INSERT_READING)
            .bind(reading.device_id.as_str())
            .bind(reading.timestamp_rfc3339())
            .bind(reading.location.as_str())
            .bind(reading.avg_db)
            .bind(reading.max_db)
            .bind(reading.battery)
            .execute(&self.pool)
            .await?;

        debug!("Inserted reading from device {}", reading.device_id);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
