//! Reading Validator

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Master switch; when false every reading is accepted
    pub enabled: bool,
    /// Reject empty device ids
    pub require_device_id: bool,
    /// Plausible sound pressure range (dB)
    pub db_range: (f64, f64),
    /// Plausible battery range (volts or percent, device dependent)
    pub battery_range: (f64, f64),
    /// Reject readings whose peak is below their average
    pub require_max_at_least_avg: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            require_device_id: true,
            db_range: (0.0, 194.0),
            battery_range: (0.0, 100.0),
            require_max_at_least_avg: true,
        }
    }
}

impl ValidationConfig {
    /// Default limits with validation switched on
    pub fn strict() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }
}

/// Validator for incoming readings
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate device id
    pub fn validate_device_id(&self, device_id: &str) -> Result<(), ValidationError> {
        if self.config.require_device_id && device_id.trim().is_empty() {
            return Err(ValidationError::MissingField("device_id"));
        }
        Ok(())
    }

    /// Validate average and peak levels
    pub fn validate_levels(&self, avg_db: f64, max_db: f64) -> Result<(), ValidationError> {
        self.validate_range("avg_db", avg_db, self.config.db_range)?;
        self.validate_range("max_db", max_db, self.config.db_range)?;
        if self.config.require_max_at_least_avg && max_db < avg_db {
            return Err(ValidationError::PeakBelowAverage { avg_db, max_db });
        }
        Ok(())
    }

    /// Validate battery level
    pub fn validate_battery(&self, battery: f64) -> Result<(), ValidationError> {
        self.validate_range("battery", battery, self.config.battery_range)
    }

    /// Run every enabled check, stopping at the first failure
    pub fn validate(
        &self,
        device_id: &str,
        avg_db: f64,
        max_db: f64,
        battery: f64,
    ) -> Result<(), ValidationError> {
        if !self.config.enabled {
            return Ok(());
        }
        self.validate_device_id(device_id)?;
        self.validate_levels(avg_db, max_db)?;
        self.validate_battery(battery)
    }
}
