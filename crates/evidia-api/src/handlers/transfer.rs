use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use evidia_core::models::TransferResponse;
use evidia_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::extract::CapabilityToken;
use crate::state::AppState;

/// Header carrying the caller's original filename for the raw-body transfer.
pub const ORIGINAL_FILENAME_HEADER: &str = "x-original-filename";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Transfer the attachment bytes: hand them to the blob store and advance the
/// record from pending to processing. May block up to the blob store timeout.
#[utoipa::path(
    put,
    path = "/api/v0/attachments/{id}/transfer",
    tag = "attachments",
    params(("id" = Uuid, Path, description = "Attachment ID")),
    request_body(content = Vec<u8>, content_type = "application/octet-stream", description = "Raw attachment bytes"),
    responses(
        (status = 200, description = "Bytes stored", body = TransferResponse),
        (status = 401, description = "Capability token rejected", body = ErrorResponse),
        (status = 404, description = "Attachment not found", body = ErrorResponse),
        (status = 409, description = "Attachment not pending", body = ErrorResponse),
        (status = 502, description = "Blob store unavailable or rejected the upload", body = ErrorResponse),
        (status = 504, description = "Blob store timed out", body = ErrorResponse)
    ),
    security(("capability_token" = []))
)]
#[tracing::instrument(skip(state, token, headers, body), fields(attachment_id = %id, operation = "transfer"))]
pub async fn transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    CapabilityToken(token): CapabilityToken,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    if body.is_empty() {
        return Err(HttpAppError(AppError::InvalidInput(
            "Request body must contain the attachment bytes".to_string(),
        )));
    }

    let original_filename = headers
        .get(ORIGINAL_FILENAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Missing {} header",
                ORIGINAL_FILENAME_HEADER
            ))
        })?
        .to_string();

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();

    let response = state
        .ingestion
        .transfer(id, &token, body, &original_filename, &content_type)
        .await?;
    Ok(Json(response))
}
