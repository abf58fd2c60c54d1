//! In-memory record store.
//!
//! Second backend behind the same traits, used by tests and local development.
//! Compare-and-swap semantics match the Postgres store: the status check and
//! the mutation happen under one write lock, so concurrent phase calls observe
//! exactly one winner.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use evidia_core::models::{
    Attachment, AttachmentStatus, MediaCounters, NewAttachment, ProvenanceEvent, ProvenanceFact,
    TransferFields,
};
use evidia_core::AppError;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{AttachmentStore, ReportStore};

#[derive(Default)]
struct Inner {
    attachments: HashMap<Uuid, Attachment>,
    reports: HashMap<Uuid, MediaCounters>,
}

/// In-memory implementation of both store traits.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a report so attachments can reference it. Reports themselves
    /// are owned by an external collaborator; only their counters live here.
    pub async fn add_report(&self, report_id: Uuid) {
        self.inner
            .write()
            .await
            .reports
            .insert(report_id, MediaCounters::default());
    }

    /// Current counters for a report, for test assertions.
    pub async fn counters(&self, report_id: Uuid) -> Option<MediaCounters> {
        self.inner.read().await.reports.get(&report_id).copied()
    }
}

#[async_trait::async_trait]
impl AttachmentStore for MemoryStore {
    async fn insert(&self, new: NewAttachment) -> Result<Attachment, AppError> {
        let mut inner = self.inner.write().await;
        if !inner.reports.contains_key(&new.report_id) {
            return Err(AppError::NotFound(format!(
                "Report {} not found",
                new.report_id
            )));
        }
        let now = Utc::now();
        let attachment = Attachment {
            id: Uuid::new_v4(),
            report_id: new.report_id,
            attachment_type: new.attachment_type,
            position: new.position,
            filename: None,
            original_name: None,
            path: None,
            url: None,
            mime_type: None,
            size: new.size,
            checksum: new.checksum,
            status: AttachmentStatus::Pending,
            provenance: vec![ProvenanceFact::now(ProvenanceEvent::Initiated)],
            created_at: now,
            updated_at: now,
        };
        inner.attachments.insert(attachment.id, attachment.clone());
        Ok(attachment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Attachment>, AppError> {
        Ok(self.inner.read().await.attachments.get(&id).cloned())
    }

    async fn begin_transfer(
        &self,
        id: Uuid,
        fields: TransferFields,
    ) -> Result<Attachment, AppError> {
        let mut inner = self.inner.write().await;
        let attachment = inner
            .attachments
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Attachment {} not found", id)))?;
        if attachment.status != AttachmentStatus::Pending {
            return Err(AppError::StateConflict {
                attachment_id: id,
                expected: AttachmentStatus::Pending,
                actual: attachment.status,
            });
        }
        attachment.status = AttachmentStatus::Processing;
        attachment.filename = Some(fields.filename);
        attachment.original_name = Some(fields.original_name);
        attachment.path = Some(fields.path);
        attachment.url = Some(fields.url);
        attachment.mime_type = Some(fields.mime_type);
        attachment
            .provenance
            .push(ProvenanceFact::now(ProvenanceEvent::Uploaded));
        attachment.updated_at = Utc::now();
        Ok(attachment.clone())
    }

    async fn complete(&self, id: Uuid) -> Result<Attachment, AppError> {
        let mut inner = self.inner.write().await;
        let attachment = inner
            .attachments
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Attachment {} not found", id)))?;
        if attachment.status != AttachmentStatus::Processing {
            return Err(AppError::StateConflict {
                attachment_id: id,
                expected: AttachmentStatus::Processing,
                actual: attachment.status,
            });
        }
        attachment.status = AttachmentStatus::Completed;
        attachment
            .provenance
            .push(ProvenanceFact::now(ProvenanceEvent::Completed));
        attachment.updated_at = Utc::now();
        Ok(attachment.clone())
    }

    async fn mark_failed(&self, id: Uuid, kind: &str, message: &str) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let Some(attachment) = inner.attachments.get_mut(&id) else {
            return Ok(());
        };
        if attachment.status.is_terminal() {
            // The record already carries its outcome.
            return Ok(());
        }
        attachment.status = AttachmentStatus::Failed;
        attachment.provenance.push(ProvenanceFact::now(ProvenanceEvent::Error {
            kind: kind.to_string(),
            message: message.to_string(),
        }));
        attachment.updated_at = Utc::now();
        Ok(())
    }

    async fn list_completed(&self, report_id: Uuid) -> Result<Vec<Attachment>, AppError> {
        let inner = self.inner.read().await;
        let mut completed: Vec<Attachment> = inner
            .attachments
            .values()
            .filter(|a| a.report_id == report_id && a.status == AttachmentStatus::Completed)
            .cloned()
            .collect();
        completed.sort_by_key(|a| a.created_at);
        Ok(completed)
    }
}

#[async_trait::async_trait]
impl ReportStore for MemoryStore {
    async fn exists(&self, report_id: Uuid) -> Result<bool, AppError> {
        Ok(self.inner.read().await.reports.contains_key(&report_id))
    }

    async fn set_media_counters(
        &self,
        report_id: Uuid,
        counters: MediaCounters,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let slot = inner
            .reports
            .get_mut(&report_id)
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))?;
        *slot = counters;
        Ok(())
    }
}
