//! Noise Ingest API Server
//!
//! Accepts noise readings from IoT devices over HTTP and persists them
//! through the storage backend selected at startup.

use axum::{
    routing::{get, post},
    Router,
};
use data_validator::Validator;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use storage::{DynamoStore, ReadingStore, SqliteStore, StorageError};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod routes;

pub use config::Settings;
pub use error::{ApiError, StartupError};

use config::{LogSettings, StorageSettings};

/// Application state shared across handlers.
///
/// Built once before the listener starts; read-only afterwards.
pub struct AppState {
    /// Storage backend chosen at startup
    pub store: Arc<dyn ReadingStore>,
    /// Reading plausibility checks
    pub validator: Validator,
    /// Ingestion counters
    pub stats: IngestStats,
    /// Prometheus handle, when the recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state around a storage backend
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self {
            store,
            validator: Validator::default(),
            stats: IngestStats::default(),
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Per-process ingestion counters
#[derive(Debug, Default)]
pub struct IngestStats {
    saved: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
}

/// Point-in-time copy of [`IngestStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub saved: u64,
    pub failed: u64,
    pub rejected: u64,
}

impl IngestStats {
    pub fn record_saved(&self) {
        self.saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            saved: self.saved.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/noise-data",
            post(routes::noise::ingest).fallback(routes::noise::method_not_allowed),
        )
        .route("/health", get(routes::health::health))
        .route("/metrics", get(routes::health::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Construct the storage backend named by the settings
pub async fn build_store(
    settings: &StorageSettings,
) -> Result<Arc<dyn ReadingStore>, StorageError> {
    if settings.use_aws {
        info!(
            "Selected DynamoDB backend (table {})",
            settings.dynamodb.table
        );
        Ok(Arc::new(DynamoStore::connect(&settings.dynamodb).await?))
    } else {
        info!(
            "Selected SQLite backend ({})",
            settings.sqlite_path.display()
        );
        Ok(Arc::new(SqliteStore::connect(&settings.sqlite_path).await?))
    }
}

/// Initialize logging
pub fn init_logging(settings: &LogSettings) {
    let level = settings.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if settings.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
    .expect("Failed to set tracing subscriber");
}

/// Serve the router on an already bound listener until shutdown
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

/// Build the storage backend, then run the server
pub async fn run_server(settings: Settings) -> Result<(), StartupError> {
    let store = build_store(&settings.storage).await?;

    let mut state =
        AppState::new(store).with_validator(Validator::new(settings.validation.clone()));
    if settings.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| StartupError::Metrics(e.to_string()))?;
        state = state.with_metrics(handle);
    }

    let listener = TcpListener::bind(&settings.server.addr).await?;
    info!("Starting API server on {}", listener.local_addr()?);

    serve(listener, Arc::new(state)).await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
