use axum::{extract::State, response::IntoResponse, Json};
use evidia_core::models::{InitiateUploadRequest, InitiateUploadResponse};
use std::sync::Arc;
use validator::Validate;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Initiate an attachment upload: create a pending record and mint its
/// capability token.
#[utoipa::path(
    post,
    path = "/api/v0/attachments/initiate",
    tag = "attachments",
    request_body = InitiateUploadRequest,
    responses(
        (status = 200, description = "Upload initiated", body = InitiateUploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Report not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(report_id = %request.report_id, operation = "initiate"))]
pub async fn initiate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InitiateUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(evidia_core::AppError::from)?;

    let response = state.ingestion.initiate(request).await?;
    Ok(Json(response))
}
