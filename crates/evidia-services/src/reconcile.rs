//! Report counter reconciler
//!
//! Recomputes the owning report's derived media counters (image count,
//! has-audio, has-video) from its completed attachments and persists them with
//! a full overwrite. Never an increment: the reconciler does not assume it is
//! the only writer of these fields, so a full recompute self-heals from any
//! prior inconsistency.

use std::sync::Arc;

use evidia_core::models::MediaCounters;
use evidia_core::AppError;
use evidia_db::{AttachmentStore, ReportStore};
use uuid::Uuid;

/// Derives and persists a report's media counters.
#[derive(Clone)]
pub struct Reconciler {
    attachments: Arc<dyn AttachmentStore>,
    reports: Arc<dyn ReportStore>,
}

impl Reconciler {
    pub fn new(attachments: Arc<dyn AttachmentStore>, reports: Arc<dyn ReportStore>) -> Self {
        Self {
            attachments,
            reports,
        }
    }

    /// Recompute the counters from the report's completed attachments and
    /// overwrite the persisted values. Idempotent: repeated calls with no
    /// intervening attachment changes produce identical output and state.
    #[tracing::instrument(skip(self), fields(report_id = %report_id))]
    pub async fn reconcile(&self, report_id: Uuid) -> Result<MediaCounters, AppError> {
        let completed = self.attachments.list_completed(report_id).await?;
        let counters = MediaCounters::from_completed(&completed);

        self.reports.set_media_counters(report_id, counters).await?;

        tracing::debug!(
            image_count = counters.image_count,
            has_audio = counters.has_audio,
            has_video = counters.has_video,
            "Report counters reconciled"
        );
        Ok(counters)
    }
}
