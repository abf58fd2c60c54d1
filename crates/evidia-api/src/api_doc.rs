//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use evidia_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Evidia Ingestion API",
        version = "0.1.0",
        description = "Attachment ingestion API: three-phase uploads (initiate, transfer, finalize) with capability tokens, external blob storage, and report media counter reconciliation. All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::initiate::initiate,
        handlers::transfer::transfer,
        handlers::finalize::finalize,
        handlers::upload::upload_complete,
    ),
    components(schemas(
        models::InitiateUploadRequest,
        models::InitiateUploadResponse,
        models::TransferResponse,
        models::Attachment,
        models::AttachmentType,
        models::AttachmentStatus,
        models::ProvenanceFact,
        models::ProvenanceEvent,
        models::MediaCounters,
        error::ErrorResponse,
    )),
    tags(
        (name = "attachments", description = "Attachment upload lifecycle")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
