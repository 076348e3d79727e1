//! Validation Error Types

use thiserror::Error;

/// Errors during reading validation
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Peak level below the average level
    #[error("max_db {max_db} is below avg_db {avg_db}")]
    PeakBelowAverage { avg_db: f64, max_db: f64 },

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}
