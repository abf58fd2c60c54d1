use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use evidia_core::models::{Attachment, AttachmentType};
use evidia_core::AppError;
use evidia_services::UploadComplete;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

struct UploadForm {
    report_id: Uuid,
    attachment_type: AttachmentType,
    position: Option<i16>,
    checksum: Option<String>,
    data: Bytes,
    filename: String,
    content_type: String,
}

/// Single-call upload path: initiate, transfer, and finalize in one request.
#[utoipa::path(
    post,
    path = "/api/v0/attachments/upload",
    tag = "attachments",
    responses(
        (status = 200, description = "Attachment uploaded and finalized", body = Attachment),
        (status = 400, description = "Invalid multipart form", body = ErrorResponse),
        (status = 404, description = "Report not found", body = ErrorResponse),
        (status = 502, description = "Blob store unavailable or rejected the upload", body = ErrorResponse),
        (status = 504, description = "Blob store timed out", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_complete"))]
pub async fn upload_complete(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let form = parse_upload_form(multipart).await?;

    let attachment = state
        .ingestion
        .upload_complete(UploadComplete {
            report_id: form.report_id,
            attachment_type: form.attachment_type,
            position: form.position,
            data: form.data,
            original_filename: form.filename,
            content_type: form.content_type,
            checksum: form.checksum,
        })
        .await?;
    Ok(Json(attachment))
}

/// Extract the file part and its accompanying form fields.
async fn parse_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut report_id = None;
    let mut attachment_type = None;
    let mut position = None;
    let mut checksum = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart form: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::InvalidInput("File part needs a filename".to_string()))?;
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read file part: {}", e)))?;
                file = Some((data, filename, content_type));
            }
            Some("report_id") => {
                let text = read_text(field).await?;
                report_id = Some(text.parse::<Uuid>().map_err(|_| {
                    AppError::InvalidInput(format!("Invalid report_id: {}", text))
                })?);
            }
            Some("type") => {
                let text = read_text(field).await?;
                attachment_type = Some(AttachmentType::parse(&text).ok_or_else(|| {
                    AppError::InvalidInput(format!(
                        "Invalid type '{}': must be image, audio, or video",
                        text
                    ))
                })?);
            }
            Some("position") => {
                let text = read_text(field).await?;
                position = Some(text.parse::<i16>().map_err(|_| {
                    AppError::InvalidInput(format!("Invalid position: {}", text))
                })?);
            }
            Some("checksum") => {
                checksum = Some(read_text(field).await?);
            }
            _ => {
                // Unknown parts are skipped, not rejected.
            }
        }
    }

    let (data, filename, content_type) =
        file.ok_or_else(|| AppError::InvalidInput("Missing file part".to_string()))?;
    if data.is_empty() {
        return Err(AppError::InvalidInput("File part is empty".to_string()));
    }

    Ok(UploadForm {
        report_id: report_id
            .ok_or_else(|| AppError::InvalidInput("Missing report_id field".to_string()))?,
        attachment_type: attachment_type
            .ok_or_else(|| AppError::InvalidInput("Missing type field".to_string()))?,
        position,
        checksum,
        data,
        filename,
        content_type,
    })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read form field: {}", e)))
}
