//! In-memory Backend

use crate::{Reading, ReadingStore, StorageError};
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::debug;

/// Append-only reading store kept in process memory
#[derive(Default)]
pub struct MemoryStore {
    readings: Mutex<Vec<Reading>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored reading, in insertion order
    pub fn readings(&self) -> Vec<Reading> {
        self.readings.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of stored readings
    pub fn len(&self) -> usize {
        self.readings.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn save_reading(&self, reading: Reading) -> Result<(), StorageError> {
        let mut readings = self
            .readings
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("Lock error: {}", e)))?;

        debug!("Stored reading from device {} in memory", reading.device_id);
        readings.push(reading);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
