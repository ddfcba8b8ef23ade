//! Router configuration for the NetFS API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    copy_node, delete_node, download_file, get_node, get_root_node, move_node, rename_node,
    upload, upload_progress, AppState,
};
use super::middleware::create_cors_layer;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let body_limit = usize::try_from(app_state.max_upload_size).unwrap_or(usize::MAX);

    // Node routes
    let node_routes = Router::new()
        .route("/node", get(get_root_node))
        .route("/node/:id", get(get_node))
        .route("/file/:id", get(download_file));

    // Upload routes
    let upload_routes = Router::new()
        .route("/upload", post(upload))
        .route("/upload/progress", get(upload_progress));

    // Tree mutation routes
    let ops_routes = Router::new()
        .route("/copy", post(copy_node))
        .route("/move", post(move_node))
        .route("/rename", post(rename_node))
        .route("/delete", post(delete_node));

    let api_routes = Router::new()
        .merge(node_routes)
        .merge(upload_routes)
        .merge(ops_routes);

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
