//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that creates an in-process router
//! over a temporary SQLite history, so tests can seed series and downloads
//! and then drive runs through the API.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use emitter_core::{
    Config, DatabaseConfig, EmitterConfig, EpisodeId, Series, ServerConfig, SqliteHistory,
};

/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_start_run() {
///     let fixture = TestFixture::new();
///     fixture.track("tv", Series::new("Show").with_begin(ep(1, 1)));
///
///     let response = fixture.post("/api/v1/runs/tv", Value::Null).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// History backing the router - seed series and downloads here
    pub history: Arc<SqliteHistory>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub fn ep(season: u32, number: u32) -> EpisodeId {
    EpisodeId::new(season, number).unwrap()
}

impl TestFixture {
    /// Create a new test fixture with emission enabled.
    pub fn new() -> Self {
        Self::with_emitter(EmitterConfig::default())
    }

    /// Create a test fixture with a custom emitter configuration.
    pub fn with_emitter(emitter: EmitterConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            emitter,
        };

        let history =
            Arc::new(SqliteHistory::new(&db_path).expect("Failed to create history store"));

        let state = Arc::new(emitter_server::state::AppState::new(config, history.clone()));

        let router = emitter_server::api::create_router(state);

        Self {
            router,
            history,
            temp_dir,
        }
    }

    /// Add `series` to the store and to run `run_id`.
    pub fn track(&self, run_id: &str, series: Series) {
        let name = series.name.clone();
        self.history.upsert_series(&series).unwrap();
        self.history.assign_to_run(run_id, &name).unwrap();
    }

    /// Record a downloaded release.
    pub fn downloaded(&self, series_name: &str, season: u32, number: u32) {
        self.history
            .record_release(series_name, ep(season, number), "release", true)
            .unwrap();
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body (`Value::Null` sends no body).
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        let body = if body.is_null() { None } else { Some(body) };
        self.request("POST", path, body).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = match body {
            Some(json) => {
                request_builder = request_builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_string(&json).unwrap())
            }
            None => Body::empty(),
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
