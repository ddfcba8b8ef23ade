//! Node listing and file content handlers.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::header,
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::web::dto::{ApiResponse, DownloadQuery, NodeListingResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Generate a safe Content-Disposition header value.
///
/// Control characters are dropped, quotes and backslashes replaced in the
/// plain `filename` parameter, and non-ASCII names additionally carried in
/// an RFC 5987 `filename*` parameter.
fn content_disposition_header(filename: &str, inline: bool) -> String {
    let disposition = if inline { "inline" } else { "attachment" };

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("{disposition}; filename=\"{filename}\"");
    }

    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();
    let encoded = urlencoding::encode(filename);

    format!("{disposition}; filename=\"{sanitized}\"; filename*=UTF-8''{encoded}")
}

/// GET /api/node - List the root directory.
pub async fn get_root_node(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<NodeListingResponse>>, ApiError> {
    let listing = state.files().listing(None).await?;
    Ok(Json(ApiResponse::new(listing.into())))
}

/// GET /api/node/:id - List a node and its children.
///
/// An ID that is not a positive integer lists the root.
pub async fn get_node(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<NodeListingResponse>>, ApiError> {
    let listing = state.files().listing(id.trim().parse().ok()).await?;
    Ok(Json(ApiResponse::new(listing.into())))
}

/// GET /api/file/:id - Download file content.
///
/// `?inline=1` or `?inline=true` asks the browser to display it.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response<Body>, ApiError> {
    let id: i64 = id
        .trim()
        .parse()
        .map_err(|_| ApiError::not_found(format!("node {id} not found")))?;

    let download = state.files().download(id).await?;

    let content_type = mime_guess::from_path(&download.node.name)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&download.node.name, query.is_inline()),
        )
        .header(header::CONTENT_LENGTH, download.content.len())
        .body(Body::from(download.content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}
