//! Storage Layer
//!
//! Provides the reading persistence port and its backends:
//! - `SqliteStore`: local embedded database (sqlx)
//! - `DynamoStore`: managed DynamoDB table (aws-sdk-dynamodb)
//! - `MemoryStore`: in-process store for tests and dry runs

mod dynamo;
mod memory;
mod reading;
mod sqlite;

pub use dynamo::{encode_item, DynamoSettings, DynamoStore};
pub use memory::MemoryStore;
pub use reading::Reading;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

/// Persistence port for sensor readings.
///
/// A successful return means the reading is durably recorded. On error the
/// caller must treat the reading as not persisted.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Persist one reading with a single synchronous write.
    async fn save_reading(&self, reading: Reading) -> Result<(), StorageError>;

    /// Short backend name used in logs and health output.
    fn backend(&self) -> &'static str;
}
