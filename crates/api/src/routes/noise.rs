//! Noise Data Ingestion Route

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use storage::Reading;
use tracing::{debug, error, warn};

use crate::error::ApiError;
use crate::AppState;

/// Request body sent by devices.
///
/// Missing fields take their zero value. A `timestamp` sent by the device is
/// ignored; the server receipt time is recorded instead.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NoiseDataRequest {
    pub device_id: String,
    pub location: String,
    pub avg_db: f64,
    pub max_db: f64,
    pub battery: f64,
}

impl NoiseDataRequest {
    /// Build the reading to persist, stamped with the receipt time
    pub fn into_reading(self, received_at: DateTime<Utc>) -> Reading {
        Reading {
            device_id: self.device_id,
            timestamp: received_at,
            location: self.location,
            avg_db: self.avg_db,
            max_db: self.max_db,
            battery: self.battery,
        }
    }
}

/// Acknowledgement body
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Decode the first JSON value in the body.
///
/// `null` yields an all-zero request and anything after the first value is
/// ignored. An empty body is an error.
fn decode(body: &[u8]) -> Result<NoiseDataRequest, serde_json::Error> {
    let first = serde_json::Deserializer::from_slice(body)
        .into_iter::<Option<NoiseDataRequest>>()
        .next();
    match first {
        Some(value) => Ok(value?.unwrap_or_default()),
        None => serde_json::from_slice(body),
    }
}

/// Accept one reading and persist it through the configured store
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let request = decode(&body).map_err(|e| {
        warn!("Rejected noise data: {}", e);
        state.stats.record_rejected();
        counter!("noise_readings_rejected_total", "reason" => "invalid_json").increment(1);
        ApiError::InvalidJson(e)
    })?;

    state
        .validator
        .validate(
            &request.device_id,
            request.avg_db,
            request.max_db,
            request.battery,
        )
        .map_err(|e| {
            warn!("Rejected reading from {:?}: {}", request.device_id, e);
            state.stats.record_rejected();
            counter!("noise_readings_rejected_total", "reason" => "validation").increment(1);
            ApiError::from(e)
        })?;

    let reading = request.into_reading(Utc::now());
    let device_id = reading.device_id.clone();
    let backend = state.store.backend();

    let started = Instant::now();
    let result = state.store.save_reading(reading).await;
    histogram!("noise_save_duration_seconds", "backend" => backend)
        .record(started.elapsed().as_secs_f64());

    if let Err(e) = result {
        error!(
            "Failed to save reading from {} to {}: {}",
            device_id, backend, e
        );
        state.stats.record_failed();
        counter!("noise_readings_failed_total").increment(1);
        return Err(e.into());
    }

    debug!("Saved reading from {} to {}", device_id, backend);
    state.stats.record_saved();
    counter!("noise_readings_saved_total").increment(1);

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Noise data saved successfully".to_string(),
        }),
    ))
}

/// Fallback for every method other than POST
pub async fn method_not_allowed(State(state): State<Arc<AppState>>, method: Method) -> ApiError {
    warn!("Rejected {} request to the ingest endpoint", method);
    state.stats.record_rejected();
    counter!("noise_readings_rejected_total", "reason" => "method").increment(1);
    ApiError::MethodNotAllowed
}
