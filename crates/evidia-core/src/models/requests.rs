use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::AttachmentType;

/// Request to initiate an attachment upload
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct InitiateUploadRequest {
    /// Owning report ID
    pub report_id: Uuid,
    /// Media type (image, audio, video)
    #[serde(rename = "type")]
    pub attachment_type: AttachmentType,
    /// Declared file size in bytes
    #[validate(range(min = 1, message = "File size must be at least 1 byte"))]
    pub size: i64,
    /// Optional caller-supplied content hash (provenance only)
    #[serde(default)]
    #[validate(length(max = 128, message = "Checksum must be at most 128 characters"))]
    pub checksum: Option<String>,
    /// Display order, images only (1..=3)
    #[serde(default)]
    pub position: Option<i16>,
}

/// Response containing the new attachment ID and its capability token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InitiateUploadResponse {
    /// Attachment ID (used for the transfer and finalize phases)
    pub attachment_id: Uuid,
    /// Capability token scoped to this attachment
    pub token: String,
    /// Token expiration time
    pub expires_at: DateTime<Utc>,
}

/// Response after a successful transfer phase
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransferResponse {
    pub attachment_id: Uuid,
    /// Absolute URL of the stored bytes
    pub url: String,
    /// Remote filename assigned by the blob store
    pub filename: String,
    /// Declared size of the attachment in bytes
    pub size: i64,
}
