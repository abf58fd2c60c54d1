//! Ingestion coordinator
//!
//! Orchestrates the three-phase upload protocol: initiate (create a pending
//! record, mint a capability token), transfer (hand bytes to the blob store,
//! advance to processing), finalize (advance to completed, reconcile the
//! owning report's counters). A convenience single-call path runs all three
//! phases back-to-back.
//!
//! The coordinator never takes a lock across instances: every status write is
//! a conditional transition performed by the record store, so concurrent phase
//! calls resolve to exactly one winner and `StateConflict` losers.

use std::sync::Arc;

use bytes::Bytes;
use evidia_core::models::{
    Attachment, AttachmentStatus, AttachmentType, InitiateUploadRequest, InitiateUploadResponse,
    NewAttachment, TransferFields, TransferResponse,
};
use evidia_core::{AppError, TokenCodec};
use evidia_db::{AttachmentStore, ReportStore};
use evidia_storage::BlobStore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::reconcile::Reconciler;

/// Arguments for the single-call upload path.
#[derive(Debug, Clone)]
pub struct UploadComplete {
    pub report_id: Uuid,
    pub attachment_type: AttachmentType,
    pub position: Option<i16>,
    pub data: Bytes,
    pub original_filename: String,
    pub content_type: String,
    /// Caller-supplied content hash; defaults to the SHA-256 hex of the data.
    pub checksum: Option<String>,
}

/// Coordinates the attachment upload lifecycle.
pub struct IngestionService {
    attachments: Arc<dyn AttachmentStore>,
    reports: Arc<dyn ReportStore>,
    blobs: Arc<dyn BlobStore>,
    tokens: TokenCodec,
    reconciler: Reconciler,
}

impl IngestionService {
    pub fn new(
        attachments: Arc<dyn AttachmentStore>,
        reports: Arc<dyn ReportStore>,
        blobs: Arc<dyn BlobStore>,
        tokens: TokenCodec,
    ) -> Self {
        let reconciler = Reconciler::new(attachments.clone(), reports.clone());
        Self {
            attachments,
            reports,
            blobs,
            tokens,
            reconciler,
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Phase 1: create a pending record and mint its capability token.
    ///
    /// No network call happens here; this phase cannot fail due to the
    /// external storage dependency.
    #[tracing::instrument(skip(self), fields(report_id = %request.report_id, attachment_type = %request.attachment_type))]
    pub async fn initiate(
        &self,
        request: InitiateUploadRequest,
    ) -> Result<InitiateUploadResponse, AppError> {
        if request.size <= 0 {
            return Err(AppError::InvalidInput(
                "size must be greater than zero".to_string(),
            ));
        }
        match (request.attachment_type, request.position) {
            (AttachmentType::Image, Some(p)) if !(1..=3).contains(&p) => {
                return Err(AppError::InvalidInput(format!(
                    "position must be between 1 and 3, got {}",
                    p
                )));
            }
            (AttachmentType::Audio | AttachmentType::Video, Some(_)) => {
                return Err(AppError::InvalidInput(
                    "position is only valid for image attachments".to_string(),
                ));
            }
            _ => {}
        }

        if !self.reports.exists(request.report_id).await? {
            return Err(AppError::NotFound(format!(
                "Report {} not found",
                request.report_id
            )));
        }

        let attachment = self
            .attachments
            .insert(NewAttachment {
                report_id: request.report_id,
                attachment_type: request.attachment_type,
                position: request.position,
                size: request.size,
                checksum: request.checksum,
            })
            .await?;

        let (token, expires_at) =
            self.tokens
                .mint(attachment.id, attachment.report_id, attachment.attachment_type);

        tracing::info!(attachment_id = %attachment.id, "Upload initiated");

        Ok(InitiateUploadResponse {
            attachment_id: attachment.id,
            token,
            expires_at,
        })
    }

    /// Phase 2: hand the bytes to the blob store and advance the record to
    /// processing.
    ///
    /// The pending precondition is checked before the upload (so an
    /// already-processed attachment costs no network call) and enforced again
    /// by the conditional transition at write time; a raced-out caller gets
    /// `StateConflict` and the winner's transfer fields stand.
    #[tracing::instrument(skip(self, token, data), fields(attachment_id = %attachment_id, size = data.len()))]
    pub async fn transfer(
        &self,
        attachment_id: Uuid,
        token: &str,
        data: Bytes,
        original_filename: &str,
        content_type: &str,
    ) -> Result<TransferResponse, AppError> {
        self.authorize(attachment_id, token)?;

        let attachment = self
            .attachments
            .get(attachment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attachment {} not found", attachment_id)))?;
        if attachment.status != AttachmentStatus::Pending {
            return Err(AppError::StateConflict {
                attachment_id,
                expected: AttachmentStatus::Pending,
                actual: attachment.status,
            });
        }

        let blob = match self.blobs.store(data, original_filename, content_type).await {
            Ok(blob) => blob,
            Err(blob_err) => {
                let err = AppError::from(blob_err);
                tracing::warn!(error = %err, attachment_id = %attachment_id, "Blob store call failed");
                if let Err(mark_err) = self
                    .attachments
                    .mark_failed(attachment_id, err.provenance_kind(), &err.to_string())
                    .await
                {
                    tracing::error!(error = %mark_err, attachment_id = %attachment_id,
                        "Failed to record transfer failure");
                }
                return Err(err);
            }
        };

        let updated = self
            .attachments
            .begin_transfer(
                attachment_id,
                TransferFields {
                    path: format!("/{}", blob.filename),
                    filename: blob.filename,
                    original_name: original_filename.to_string(),
                    url: blob.url,
                    mime_type: content_type.to_string(),
                },
            )
            .await?;

        tracing::info!(attachment_id = %attachment_id, url = %updated.url.as_deref().unwrap_or_default(),
            "Transfer complete");

        Ok(TransferResponse {
            attachment_id,
            url: updated.url.unwrap_or_default(),
            filename: updated.filename.unwrap_or_default(),
            size: updated.size,
        })
    }

    /// Phase 3: advance the record to completed and reconcile the owning
    /// report's counters.
    ///
    /// Reconciliation failure never rolls back a successful upload: the
    /// record stays completed and the failure surfaces as
    /// `ReconciliationFailed` for out-of-band retry.
    #[tracing::instrument(skip(self, token), fields(attachment_id = %attachment_id))]
    pub async fn finalize(
        &self,
        attachment_id: Uuid,
        token: &str,
    ) -> Result<Attachment, AppError> {
        self.authorize(attachment_id, token)?;

        let attachment = self.attachments.complete(attachment_id).await?;

        if let Err(err) = self.reconciler.reconcile(attachment.report_id).await {
            tracing::error!(error = %err, report_id = %attachment.report_id,
                "Counter reconciliation failed after finalize");
            return Err(AppError::ReconciliationFailed {
                report_id: attachment.report_id,
                source: anyhow::Error::new(err),
            });
        }

        tracing::info!(attachment_id = %attachment_id, report_id = %attachment.report_id,
            "Attachment finalized");
        Ok(attachment)
    }

    /// Convenience composition: initiate, transfer, and finalize in one call.
    ///
    /// Any phase failure aborts the chain and surfaces that phase's error; the
    /// record is left in whatever state the failed phase produced, which keeps
    /// the audit trail intact for diagnosis.
    #[tracing::instrument(skip(self, upload), fields(report_id = %upload.report_id))]
    pub async fn upload_complete(&self, upload: UploadComplete) -> Result<Attachment, AppError> {
        let checksum = upload
            .checksum
            .unwrap_or_else(|| hex::encode(Sha256::digest(&upload.data)));

        let initiated = self
            .initiate(InitiateUploadRequest {
                report_id: upload.report_id,
                attachment_type: upload.attachment_type,
                size: upload.data.len() as i64,
                checksum: Some(checksum),
                position: upload.position,
            })
            .await?;

        self.transfer(
            initiated.attachment_id,
            &initiated.token,
            upload.data,
            &upload.original_filename,
            &upload.content_type,
        )
        .await?;

        self.finalize(initiated.attachment_id, &initiated.token).await
    }

    /// Verify the capability token and its scope.
    fn authorize(&self, attachment_id: Uuid, token: &str) -> Result<(), AppError> {
        let claims = self.tokens.verify(token)?;
        if claims.attachment_id != attachment_id {
            return Err(AppError::TokenInvalid(
                "token is scoped to a different attachment".to_string(),
            ));
        }
        Ok(())
    }
}
