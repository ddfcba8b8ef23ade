//! Test helpers for web API tests.
//!
//! Provides a TestApp wrapping an axum-test server over an in-memory
//! database and a temporary blob directory.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use netfs::file::BlobStore;
use netfs::progress::ProgressNotifier;
use netfs::web::handlers::AppState;
use netfs::web::router::{create_health_router, create_router};
use netfs::Database;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Progress buffer with room for every distinct percentage.
const PROGRESS_CAPACITY: usize = 128;

/// A running test application.
pub struct TestApp {
    /// In-process HTTP test server.
    pub server: TestServer,
    /// Shared application state.
    pub state: Arc<AppState>,
    _temp_dir: TempDir,
}

impl TestApp {
    /// Create a test application with default limits.
    pub async fn new() -> Self {
        Self::with_limits(1024 * 1024, Duration::from_secs(30)).await
    }

    /// Create a test application with a body limit and progress keepalive.
    pub async fn with_limits(max_upload_size: u64, keepalive: Duration) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let db = Database::open_in_memory()
            .await
            .expect("Failed to create test database");
        let blobs =
            BlobStore::new(temp_dir.path().join("blobs")).expect("Failed to create blob store");

        let state = Arc::new(
            AppState::new(Arc::new(db), Arc::new(blobs))
                .with_progress(Arc::new(ProgressNotifier::new(PROGRESS_CAPACITY)), keepalive)
                .with_max_upload_size(max_upload_size),
        );

        let server =
            TestServer::new(Self::build_router(&state)).expect("Failed to create test server");

        Self {
            server,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Build a fresh router over this app's state.
    pub fn router(&self) -> Router {
        Self::build_router(&self.state)
    }

    fn build_router(state: &Arc<AppState>) -> Router {
        create_router(Arc::clone(state), &[]).merge(create_health_router())
    }

    /// Upload a file with JSON and return the response body.
    pub async fn upload_json(
        &self,
        filename: &str,
        content: &[u8],
        parent_id: Option<i64>,
    ) -> Value {
        use base64::Engine;

        self.server
            .post("/api/upload")
            .json(&json!({
                "filename": filename,
                "is_dir": false,
                "parent_id": parent_id,
                "data_base64": base64::engine::general_purpose::STANDARD.encode(content),
            }))
            .await
            .json::<Value>()
    }

    /// Upload a file and return its node ID.
    pub async fn upload_file(&self, filename: &str, content: &[u8], parent_id: Option<i64>) -> i64 {
        let body = self.upload_json(filename, content, parent_id).await;
        node_id(&body)
    }

    /// Create a directory and return its node ID.
    pub async fn mkdir(&self, name: &str, parent_id: Option<i64>) -> i64 {
        let body = self
            .server
            .post("/api/upload")
            .json(&json!({
                "filename": name,
                "is_dir": true,
                "parent_id": parent_id,
            }))
            .await
            .json::<Value>();
        node_id(&body)
    }

    /// Fetch a node listing.
    pub async fn node(&self, id: i64) -> Value {
        self.server
            .get(&format!("/api/node/{id}"))
            .await
            .json::<Value>()
    }

    /// Fetch file content.
    pub async fn content(&self, id: i64) -> Vec<u8> {
        let response = self.server.get(&format!("/api/file/{id}")).await;
        response.assert_status_ok();
        response.as_bytes().to_vec()
    }
}

/// Extract `data.node_id` from a response body.
pub fn node_id(body: &Value) -> i64 {
    body["data"]["node_id"]
        .as_i64()
        .unwrap_or_else(|| panic!("no node_id in {body}"))
}

/// Build a multipart upload form.
pub fn multipart_upload(filename: &str, content: &[u8]) -> MultipartForm {
    MultipartForm::new()
        .add_text("filename", filename)
        .add_part(
            "file",
            Part::bytes(content.to_vec())
                .file_name(filename)
                .mime_type("application/octet-stream"),
        )
}

/// Names of the children in a listing, in order.
pub fn child_names(listing: &Value) -> Vec<String> {
    listing["data"]["children"]
        .as_array()
        .map(|children| {
            children
                .iter()
                .filter_map(|c| c["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
