//! Upload and upload progress handlers.

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        FromRequest, Multipart, Query, Request, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::sse::{Event, Sse},
    Json,
};
use base64::Engine;
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;

use crate::progress::{percent, progress_events, ProgressEvent};
use crate::web::dto::{ApiResponse, JsonUploadRequest, NodeCreatedResponse, ProgressQuery};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Fields collected from an upload request.
#[derive(Debug, Default)]
struct UploadForm {
    filename: Option<String>,
    is_dir: bool,
    parent_id: Option<i64>,
    upload_id: Option<String>,
    size: Option<u64>,
    content: Vec<u8>,
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Upload exceeds the maximum size")
    } else {
        ApiError::bad_request(format!("Invalid multipart data: {}", e.body_text()))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "true" | "1")
}

fn parse_parent_id(value: &str) -> Result<Option<i64>, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ApiError::bad_request(format!("invalid parent_id: {value}")))
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Read the `file` field chunk by chunk, publishing progress as it goes.
async fn read_file_field(
    state: &AppState,
    form: &mut UploadForm,
    mut field: Field<'_>,
    total: Option<u64>,
) -> Result<(), ApiError> {
    if form.filename.is_none() {
        form.filename = field.file_name().map(str::to_string);
    }

    let mut last_pct = 0;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        form.content.extend_from_slice(&chunk);

        if let (Some(token), Some(total)) = (form.upload_id.as_deref(), total) {
            let pct = percent(form.content.len() as u64, total);
            if pct > last_pct {
                state.progress.publish(token, pct);
                last_pct = pct;
            }
        }
    }

    Ok(())
}

/// Collect the multipart fields into `form`.
///
/// Progress is only reported when `upload_id` precedes the `file` field.
async fn read_multipart(
    state: &AppState,
    form: &mut UploadForm,
    mut multipart: Multipart,
    content_length: Option<u64>,
) -> Result<(), ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            let total = form.size.or(content_length);
            read_file_field(state, form, field, total).await?;
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        match name.as_str() {
            "filename" => form.filename = Some(value),
            "is_dir" => form.is_dir = parse_flag(&value),
            "parent_id" => form.parent_id = parse_parent_id(&value)?,
            "upload_id" => {
                let value = value.trim();
                if !value.is_empty() {
                    form.upload_id = Some(value.to_string());
                }
            }
            "size" => form.size = value.trim().parse().ok().filter(|size| *size > 0),
            _ => {}
        }
    }

    Ok(())
}

fn read_json(req: JsonUploadRequest) -> Result<UploadForm, ApiError> {
    let content = match req.data_base64 {
        Some(data) if !req.is_dir => base64::engine::general_purpose::STANDARD
            .decode(data.trim())
            .map_err(|e| ApiError::bad_request(format!("failed to decode base64: {e}")))?,
        _ => Vec::new(),
    };

    Ok(UploadForm {
        filename: Some(req.filename),
        is_dir: req.is_dir,
        parent_id: req.parent_id,
        content,
        ..UploadForm::default()
    })
}

/// POST /api/upload - Create or merge a file or directory.
///
/// Accepts `multipart/form-data` (fields `filename`, `is_dir`, `parent_id`,
/// `upload_id`, `size`, `file`) or JSON with base64 content.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<ApiResponse<NodeCreatedResponse>>, ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    let mut form = UploadForm::default();

    let parsed = if content_type.starts_with("multipart/form-data") {
        let length = content_length(request.headers());
        match Multipart::from_request(request, &state).await {
            Ok(multipart) => read_multipart(&state, &mut form, multipart, length).await,
            Err(e) => Err(ApiError::bad_request(e.body_text())),
        }
    } else if content_type.starts_with("application/json") {
        match Json::<JsonUploadRequest>::from_request(request, &state).await {
            Ok(Json(req)) => read_json(req).map(|parsed| form = parsed),
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => Err(
                ApiError::payload_too_large("Upload exceeds the maximum size"),
            ),
            Err(e) => Err(ApiError::bad_request(format!(
                "failed to decode json: {}",
                e.body_text()
            ))),
        }
    } else {
        Err(ApiError::unsupported_media_type(format!(
            "unsupported content type: {content_type}"
        )))
    };

    let result = match parsed {
        Ok(()) => {
            let name = form.filename.as_deref().unwrap_or("");
            state
                .files()
                .upload(name, &form.content, form.is_dir, form.parent_id)
                .await
                .map_err(ApiError::from)
        }
        Err(e) => Err(e),
    };

    match (&result, form.upload_id.as_deref()) {
        (Ok(_), Some(token)) => state.progress.finish(token),
        (Err(_), Some(token)) => state.progress.unsubscribe(token),
        _ => {}
    }

    let node_id = result?;
    Ok(Json(ApiResponse::new(NodeCreatedResponse { node_id })))
}

/// GET /api/upload/progress?upload_id=... - Stream upload progress as SSE.
///
/// Sends `data: <percent>` events, starting at 0 and ending after 100, with
/// `: keepalive` comments while idle.
pub async fn upload_progress(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProgressQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let token = query
        .upload_id
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("upload_id query parameter is required"))?;

    tracing::debug!(upload_id = %token, "Progress stream opened");
    let subscription = state.progress.subscribe(token);

    let events = progress_events(subscription, state.progress_keepalive).map(|event| {
        Ok(match event {
            ProgressEvent::Percent(pct) => Event::default().data(pct.to_string()),
            ProgressEvent::KeepAlive => Event::default().comment("keepalive"),
        })
    });

    Ok(Sse::new(events))
}
