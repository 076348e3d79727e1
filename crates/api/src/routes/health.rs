//! Health and Metrics Routes

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub backend: String,
    pub readings_saved: u64,
    pub readings_failed: u64,
    pub readings_rejected: u64,
}

/// Health check handler
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let stats = state.stats.snapshot();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        backend: state.store.backend().to_string(),
        readings_saved: stats.saved,
        readings_failed: stats.failed,
        readings_rejected: stats.rejected,
    })
}

/// Prometheus exposition, available when the recorder is installed
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_router;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use storage::MemoryStore;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_backend() {
        let state = Arc::new(AppState::new(Arc::new(MemoryStore::new())));
        state.stats.record_saved();

        let response = create_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["backend"], "memory");
        assert_eq!(body["readings_saved"], 1);
        assert_eq!(body["readings_failed"], 0);
        assert_eq!(body["readings_rejected"], 0);
        assert!(body["uptime_seconds"].is_u64());
        assert!(body.get("readings").is_none());
    }

    #[tokio::test]
    async fn test_metrics_absent_without_recorder() {
        let state = Arc::new(AppState::new(Arc::new(MemoryStore::new())));

        let response = create_router(state)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_metrics_exposes_ingest_counters() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let state =
            AppState::new(Arc::new(MemoryStore::new())).with_metrics(recorder.handle());
        let app = create_router(Arc::new(state));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let text = metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                let body = r#"{"device_id":"dev-1","avg_db":40.0,"max_db":50.0,"battery":3.8}"#;
                let response = app
                    .clone()
                    .oneshot(
                        Request::post("/api/noise-data")
                            .body(Body::from(body))
                            .unwrap(),
                    )
                    .await
                    .unwrap();
                assert_eq!(response.status(), StatusCode::CREATED);

                let response = app
                    .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
                    .await
                    .unwrap();
                assert_eq!(response.status(), StatusCode::OK);

                let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
                String::from_utf8(bytes.to_vec()).unwrap()
            })
        });

        assert!(text.contains("noise_readings_saved_total 1"));
        assert!(text.contains("noise_save_duration_seconds"));
    }
}
