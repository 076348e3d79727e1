//! Reading Model

use chrono::{DateTime, SecondsFormat, Utc};

/// One noise observation reported by a device
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub device_id: String,
    /// Server receipt time
    pub timestamp: DateTime<Utc>,
    pub location: String,
    pub avg_db: f64,
    pub max_db: f64,
    pub battery: f64,
}

impl Reading {
    /// Timestamp as stored by every backend (RFC 3339, UTC, milliseconds)
    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
