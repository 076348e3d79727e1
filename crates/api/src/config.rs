//! Service Configuration
//!
//! Settings come from built-in defaults, an optional config file
//! (`noise-ingest.toml` or the path in `NOISE_CONFIG`) and `NOISE__*`
//! environment variables, in increasing priority.
//!
//! ```text
//! NOISE__STORAGE__USE_AWS=true
//! NOISE__STORAGE__DYNAMODB__TABLE=NoiseData
//! NOISE__STORAGE__DYNAMODB__VERIFY_TABLE=false
//! NOISE__SERVER__ADDR=0.0.0.0:9000
//! ```

use config::{Config, ConfigError, Environment, File};
use data_validator::ValidationConfig;
use serde::Deserialize;
use std::path::PathBuf;
use storage::DynamoSettings;

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_VAR: &str = "NOISE_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "noise-ingest";

/// Top-level service settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub validation: ValidationConfig,
    pub log: LogSettings,
    pub metrics: MetricsSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address
    pub addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Backend selection and per-backend settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `true` selects DynamoDB, `false` the local SQLite file
    pub use_aws: bool,
    pub sqlite_path: PathBuf,
    pub dynamodb: DynamoSettings,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            use_aws: false,
            sqlite_path: PathBuf::from("noise_data.db"),
            dynamodb: DynamoSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Install the Prometheus recorder and serve `/metrics`
    pub enabled: bool,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Settings {
    /// Load settings from the default file location and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_sources(&path, environment())
    }

    /// Load settings from an explicit file (missing file is not an error) and env source
    pub fn from_sources(path: &str, env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

/// `NOISE__SECTION__KEY` environment source
pub fn environment() -> Environment {
    Environment::with_prefix("NOISE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
