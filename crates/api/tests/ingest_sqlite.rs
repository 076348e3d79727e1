//! End-to-end ingestion against a real listener and SQLite file

use api::{serve, AppState};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use storage::SqliteStore;
use tempfile::TempDir;
use tokio::net::TcpListener;

type Row = (String, String, String, f64, f64, f64);

async fn start() -> (TempDir, Arc<SqliteStore>, SocketAddr) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        SqliteStore::connect(dir.path().join("noise.db"))
            .await
            .unwrap(),
    );
    let state = Arc::new(AppState::new(store.clone()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, state));

    (dir, store, addr)
}

async fn rows(store: &SqliteStore) -> Vec<Row> {
    sqlx::query_as::<_, Row>(
        "SELECT device_id, timestamp, location, avg_db, max_db, battery FROM noise_data",
    )
    .fetch_all(store.pool())
    .await
    .unwrap()
}

#[tokio::test]
async fn test_post_persists_one_row() {
    let (_dir, store, addr) = start().await;

    let sent_at = Utc::now();
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/noise-data"))
        .json(&json!({
            "device_id": "dev-1",
            "location": "kitchen",
            "avg_db": 40.2,
            "max_db": 55.0,
            "battery": 3.8
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({"message": "Noise data saved successfully"}));

    let rows = rows(&store).await;
    assert_eq!(rows.len(), 1);

    let (device_id, timestamp, location, avg_db, max_db, battery) = &rows[0];
    assert_eq!(device_id, "dev-1");
    assert_eq!(location, "kitchen");
    assert!((avg_db - 40.2).abs() < 1e-9);
    assert!((max_db - 55.0).abs() < 1e-9);
    assert!((battery - 3.8).abs() < 1e-9);

    let stored: DateTime<Utc> = timestamp.parse().unwrap();
    assert!((stored - sent_at).num_seconds().abs() <= 5);
}

#[tokio::test]
async fn test_numeric_values_round_trip() {
    let (_dir, store, addr) = start().await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/noise-data"))
        .json(&json!({
            "device_id": "dev-7",
            "timestamp": "2001-02-03T04:05:06Z",
            "location": "roof",
            "avg_db": 42.375,
            "max_db": 88.0,
            "battery": 3.701
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let rows = rows(&store).await;
    let (_, timestamp, _, avg_db, max_db, battery) = &rows[0];
    assert!((avg_db - 42.375).abs() < 1e-4);
    assert!((max_db - 88.0).abs() < 1e-4);
    assert!((battery - 3.701).abs() < 1e-4);
    assert!(!timestamp.starts_with("2001"));
}

#[tokio::test]
async fn test_rejected_requests_write_nothing() {
    let (_dir, store, addr) = start().await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/api/noise-data");

    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);

    let response = client.post(&url).body("{not json").send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    assert!(rows(&store).await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_posts_each_persisted_once() {
    let (_dir, store, addr) = start().await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/api/noise-data");

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let client = client.clone();
            let url = url.clone();
            tokio::spawn(async move {
                client
                    .post(&url)
                    .json(&json!({
                        "device_id": format!("dev-{i}"),
                        "location": "street",
                        "avg_db": 50.0 + i as f64,
                        "max_db": 70.0,
                        "battery": 3.9
                    }))
                    .send()
                    .await
                    .unwrap()
                    .status()
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), reqwest::StatusCode::CREATED);
    }

    let mut ids: Vec<_> = rows(&store).await.into_iter().map(|r| r.0).collect();
    assert_eq!(ids.len(), 20);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
}
