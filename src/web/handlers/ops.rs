//! Copy, move, rename and delete handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;

use crate::web::dto::{
    ApiResponse, DeleteRequest, NodeCreatedResponse, RenameRequest, SuccessResponse,
    TransferRequest,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Unwrap a JSON body, reporting malformed input as a bad request.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(req)| req)
        .map_err(|e| ApiError::bad_request(format!("invalid json: {}", e.body_text())))
}

/// POST /api/copy - Deep-copy a node into a directory.
pub async fn copy_node(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<NodeCreatedResponse>>, ApiError> {
    let req = json_body(body)?;

    let node_id = state
        .files()
        .copy(req.src_id, req.dst_id, req.overwrite)
        .await?;

    Ok(Json(ApiResponse::new(NodeCreatedResponse { node_id })))
}

/// POST /api/move - Move a node into a directory.
pub async fn move_node(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SuccessResponse>>, ApiError> {
    let req = json_body(body)?;

    state
        .files()
        .move_node(req.src_id, req.dst_id, req.overwrite)
        .await?;

    Ok(Json(ApiResponse::new(SuccessResponse::ok())))
}

/// POST /api/rename - Rename a node in place.
pub async fn rename_node(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SuccessResponse>>, ApiError> {
    let req = json_body(body)?;

    state.files().rename(req.src_id, &req.new_name).await?;

    Ok(Json(ApiResponse::new(SuccessResponse::ok())))
}

/// POST /api/delete - Delete a node and its subtree.
pub async fn delete_node(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SuccessResponse>>, ApiError> {
    let req = json_body(body)?;

    state.files().delete(req.src_id).await?;

    Ok(Json(ApiResponse::new(SuccessResponse::ok())))
}
