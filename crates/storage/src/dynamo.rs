//! DynamoDB Backend
//!
//! Each reading becomes one item written with a single `PutItem`. The table's
//! key schema (typically `device_id` + `timestamp`) is owned by the table
//! definition, not by this module.

use crate::{Reading, ReadingStore, StorageError};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// DynamoDB connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DynamoSettings {
    /// Target table name
    pub table: String,
    /// Region override; falls back to the default provider chain
    pub region: Option<String>,
    /// Endpoint override (DynamoDB Local, LocalStack)
    pub endpoint_url: Option<String>,
    /// Check the table with `DescribeTable` at startup; needs `dynamodb:DescribeTable`
    pub verify_table: bool,
}

impl Default for DynamoSettings {
    fn default() -> Self {
        Self {
            table: "NoiseData".to_string(),
            region: None,
            endpoint_url: None,
            verify_table: true,
        }
    }
}

/// Reading store backed by a DynamoDB table
pub struct DynamoStore {
    client: Client,
    table: String,
}

impl DynamoStore {
    /// Load AWS configuration, build a client and check the table is reachable
    pub async fn connect(settings: &DynamoSettings) -> Result<Self, StorageError> {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).retry_config(RetryConfig::disabled());
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        if sdk_config.region().is_none() {
            return Err(StorageError::Unavailable(
                "no AWS region configured".to_string(),
            ));
        }

        let store = Self::from_client(Client::new(&sdk_config), settings.table.clone());
        if settings.verify_table {
            store.verify_table().await?;
        }

        info!("DynamoDB store ready (table {})", store.table);
        Ok(store)
    }

    /// Confirm the table exists and the credentials can reach it
    pub async fn verify_table(&self) -> Result<(), StorageError> {
        self.client
            .describe_table()
            .table_name(&self.table)
            .send()
            .await
            .map_err(|e| {
                StorageError::Unavailable(format!(
                    "table {}: {}",
                    self.table,
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    /// Wrap an already configured client
    pub fn from_client(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

/// Attribute map written for a reading.
///
/// Numbers use the shortest decimal form that parses back to the same `f64`.
pub fn encode_item(reading: &Reading) -> HashMap<String, AttributeValue> {
    [
        ("device_id", AttributeValue::S(reading.device_id.clone())),
        ("timestamp", AttributeValue::S(reading.timestamp_rfc3339())),
        ("location", AttributeValue::S(reading.location.clone())),
        ("avg_db", AttributeValue::N(reading.avg_db.to_string())),
        ("max_db", AttributeValue::N(reading.max_db.to_string())),
        ("battery", AttributeValue::N(reading.battery.to_string())),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}

#[async_trait]
impl ReadingStore for DynamoStore {
    async fn save_reading(&self, reading: Reading) -> Result<(), StorageError> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(encode_item(&reading)))
            .send()
            .await
            .map_err(|e| StorageError::Backend(DisplayErrorContext(&e).to_string()))?;

        debug!(
            "Put reading from device {} into {}",
            reading.device_id, self.table
        );
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "dynamodb"
    }
}
