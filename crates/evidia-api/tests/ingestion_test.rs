//! Ingestion API integration tests.
//!
//! Exercises the three-phase upload over HTTP against the in-memory backends,
//! plus the single-call upload path and the failure taxonomy status codes.

mod helpers;

use bytes::Bytes;
use evidia_core::models::{Attachment, InitiateUploadResponse, TransferResponse};
use evidia_storage::FailureMode;
use helpers::{setup_test_app, MultipartBuilder};
use serde_json::json;
use uuid::Uuid;

const JPEG_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0fake-jpeg-payload";

async fn initiate_image(app: &helpers::TestApp, report_id: Uuid) -> InitiateUploadResponse {
    let response = app
        .server
        .post("/api/v0/attachments/initiate")
        .json(&json!({
            "report_id": report_id,
            "type": "image",
            "size": JPEG_BYTES.len(),
            "position": 1
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    response.json::<InitiateUploadResponse>()
}

#[tokio::test]
async fn test_three_phase_upload_flow() {
    let app = setup_test_app();
    let report_id = app.seed_report().await;

    let initiated = initiate_image(&app, report_id).await;
    assert!(!initiated.token.is_empty());

    let transfer = app
        .server
        .put(&format!(
            "/api/v0/attachments/{}/transfer",
            initiated.attachment_id
        ))
        .add_header("Authorization", format!("Bearer {}", initiated.token))
        .add_header("Content-Type", "image/jpeg")
        .add_header("x-original-filename", "holiday.jpg")
        .bytes(Bytes::from_static(JPEG_BYTES))
        .await;
    assert_eq!(transfer.status_code(), 200);
    let transfer = transfer.json::<TransferResponse>();
    assert_eq!(transfer.attachment_id, initiated.attachment_id);
    assert!(transfer.url.starts_with(helpers::BLOB_BASE_URL));
    assert_eq!(app.blobs.blob_count().await, 1);

    let finalize = app
        .server
        .post(&format!(
            "/api/v0/attachments/{}/finalize",
            initiated.attachment_id
        ))
        .add_header("Authorization", format!("Bearer {}", initiated.token))
        .await;
    assert_eq!(finalize.status_code(), 200);
    let attachment = finalize.json::<Attachment>();
    assert_eq!(attachment.status.as_str(), "completed");
    // Provenance: initiated, uploaded, completed.
    assert_eq!(attachment.provenance.len(), 3);

    let counters = app.store.counters(report_id).await.unwrap();
    assert_eq!(counters.image_count, 1);
    assert!(!counters.has_audio);
    assert!(!counters.has_video);
}

#[tokio::test]
async fn test_initiate_unknown_report_returns_404() {
    let app = setup_test_app();

    let response = app
        .server
        .post("/api/v0/attachments/initiate")
        .json(&json!({
            "report_id": Uuid::new_v4(),
            "type": "image",
            "size": 10
        }))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_initiate_rejects_position_on_audio() {
    let app = setup_test_app();
    let report_id = app.seed_report().await;

    let response = app
        .server
        .post("/api/v0/attachments/initiate")
        .json(&json!({
            "report_id": report_id,
            "type": "audio",
            "size": 10,
            "position": 1
        }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_initiate_rejects_zero_size() {
    let app = setup_test_app();
    let report_id = app.seed_report().await;

    let response = app
        .server
        .post("/api/v0/attachments/initiate")
        .json(&json!({
            "report_id": report_id,
            "type": "image",
            "size": 0
        }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_transfer_rejects_garbage_token() {
    let app = setup_test_app();
    let report_id = app.seed_report().await;
    let initiated = initiate_image(&app, report_id).await;

    let response = app
        .server
        .put(&format!(
            "/api/v0/attachments/{}/transfer",
            initiated.attachment_id
        ))
        .add_header("Authorization", "Bearer not-a-real-token")
        .add_header("x-original-filename", "holiday.jpg")
        .bytes(Bytes::from_static(JPEG_BYTES))
        .await;
    assert_eq!(response.status_code(), 401);
    assert_eq!(app.blobs.blob_count().await, 0);
}

#[tokio::test]
async fn test_transfer_rejects_missing_authorization() {
    let app = setup_test_app();
    let report_id = app.seed_report().await;
    let initiated = initiate_image(&app, report_id).await;

    let response = app
        .server
        .put(&format!(
            "/api/v0/attachments/{}/transfer",
            initiated.attachment_id
        ))
        .add_header("x-original-filename", "holiday.jpg")
        .bytes(Bytes::from_static(JPEG_BYTES))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_transfer_requires_original_filename_header() {
    let app = setup_test_app();
    let report_id = app.seed_report().await;
    let initiated = initiate_image(&app, report_id).await;

    let response = app
        .server
        .put(&format!(
            "/api/v0/attachments/{}/transfer",
            initiated.attachment_id
        ))
        .add_header("Authorization", format!("Bearer {}", initiated.token))
        .bytes(Bytes::from_static(JPEG_BYTES))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_duplicate_transfer_conflicts() {
    let app = setup_test_app();
    let report_id = app.seed_report().await;
    let initiated = initiate_image(&app, report_id).await;
    let path = format!("/api/v0/attachments/{}/transfer", initiated.attachment_id);

    let first = app
        .server
        .put(&path)
        .add_header("Authorization", format!("Bearer {}", initiated.token))
        .add_header("x-original-filename", "holiday.jpg")
        .bytes(Bytes::from_static(JPEG_BYTES))
        .await;
    assert_eq!(first.status_code(), 200);

    let second = app
        .server
        .put(&path)
        .add_header("Authorization", format!("Bearer {}", initiated.token))
        .add_header("x-original-filename", "holiday.jpg")
        .bytes(Bytes::from_static(JPEG_BYTES))
        .await;
    assert_eq!(second.status_code(), 409);
    let body = second.json::<serde_json::Value>();
    assert_eq!(body["code"], "STATE_CONFLICT");

    // The replay stored nothing new.
    assert_eq!(app.blobs.blob_count().await, 1);
}

#[tokio::test]
async fn test_finalize_before_transfer_conflicts() {
    let app = setup_test_app();
    let report_id = app.seed_report().await;
    let initiated = initiate_image(&app, report_id).await;

    let response = app
        .server
        .post(&format!(
            "/api/v0/attachments/{}/finalize",
            initiated.attachment_id
        ))
        .add_header("Authorization", format!("Bearer {}", initiated.token))
        .await;
    assert_eq!(response.status_code(), 409);
}

#[tokio::test]
async fn test_blob_store_timeout_maps_to_504_and_fails_record() {
    let app = setup_test_app();
    let report_id = app.seed_report().await;
    let initiated = initiate_image(&app, report_id).await;

    app.blobs.fail_next(FailureMode::Timeout).await;
    let transfer = app
        .server
        .put(&format!(
            "/api/v0/attachments/{}/transfer",
            initiated.attachment_id
        ))
        .add_header("Authorization", format!("Bearer {}", initiated.token))
        .add_header("x-original-filename", "holiday.jpg")
        .bytes(Bytes::from_static(JPEG_BYTES))
        .await;
    assert_eq!(transfer.status_code(), 504);

    // Record is failed now, so the lifecycle cannot continue.
    let finalize = app
        .server
        .post(&format!(
            "/api/v0/attachments/{}/finalize",
            initiated.attachment_id
        ))
        .add_header("Authorization", format!("Bearer {}", initiated.token))
        .await;
    assert_eq!(finalize.status_code(), 409);
}

#[tokio::test]
async fn test_blob_store_rejection_maps_to_502() {
    let app = setup_test_app();
    let report_id = app.seed_report().await;
    let initiated = initiate_image(&app, report_id).await;

    app.blobs.fail_next(FailureMode::Rejected).await;
    let transfer = app
        .server
        .put(&format!(
            "/api/v0/attachments/{}/transfer",
            initiated.attachment_id
        ))
        .add_header("Authorization", format!("Bearer {}", initiated.token))
        .add_header("x-original-filename", "holiday.jpg")
        .bytes(Bytes::from_static(JPEG_BYTES))
        .await;
    assert_eq!(transfer.status_code(), 502);
}

#[tokio::test]
async fn test_single_call_upload() {
    let app = setup_test_app();
    let report_id = app.seed_report().await;

    let body = MultipartBuilder::new()
        .text("report_id", &report_id.to_string())
        .text("type", "video")
        .file("clip.mp4", "video/mp4", b"fake-mp4-payload")
        .build();

    let response = app
        .server
        .post("/api/v0/attachments/upload")
        .add_header("Content-Type", MultipartBuilder::content_type())
        .bytes(body)
        .await;
    assert_eq!(response.status_code(), 200);
    let attachment = response.json::<Attachment>();
    assert_eq!(attachment.status.as_str(), "completed");
    assert_eq!(attachment.report_id, report_id);

    let counters = app.store.counters(report_id).await.unwrap();
    assert!(counters.has_video);
    assert_eq!(counters.image_count, 0);
}

#[tokio::test]
async fn test_single_call_upload_missing_file_part() {
    let app = setup_test_app();
    let report_id = app.seed_report().await;

    let body = MultipartBuilder::new()
        .text("report_id", &report_id.to_string())
        .text("type", "image")
        .build();

    let response = app
        .server
        .post("/api/v0/attachments/upload")
        .add_header("Content-Type", MultipartBuilder::content_type())
        .bytes(body)
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = setup_test_app();

    let live = app.server.get("/health/live").await;
    assert_eq!(live.status_code(), 200);

    let health = app.server.get("/health").await;
    assert_eq!(health.status_code(), 200);
    let body = health.json::<serde_json::Value>();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["blob_store"], "healthy");
}

#[tokio::test]
async fn test_openapi_spec_is_served() {
    let app = setup_test_app();

    let response = app.server.get("/api/openapi.json").await;
    assert_eq!(response.status_code(), 200);
    let spec = response.json::<serde_json::Value>();
    assert!(spec["paths"]["/api/v0/attachments/initiate"].is_object());
}
