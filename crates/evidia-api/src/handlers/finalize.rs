use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use evidia_core::models::Attachment;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::extract::CapabilityToken;
use crate::state::AppState;

/// Finalize the attachment: advance processing to completed and reconcile the
/// owning report's media counters.
#[utoipa::path(
    post,
    path = "/api/v0/attachments/{id}/finalize",
    tag = "attachments",
    params(("id" = Uuid, Path, description = "Attachment ID")),
    responses(
        (status = 200, description = "Attachment finalized", body = Attachment),
        (status = 401, description = "Capability token rejected", body = ErrorResponse),
        (status = 404, description = "Attachment not found", body = ErrorResponse),
        (status = 409, description = "Attachment not processing", body = ErrorResponse),
        (status = 500, description = "Finalized but counter reconciliation failed", body = ErrorResponse)
    ),
    security(("capability_token" = []))
)]
#[tracing::instrument(skip(state, token), fields(attachment_id = %id, operation = "finalize"))]
pub async fn finalize(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    CapabilityToken(token): CapabilityToken,
) -> Result<impl IntoResponse, HttpAppError> {
    let attachment = state.ingestion.finalize(id, &token).await?;
    Ok(Json(attachment))
}
