//! Record store abstraction traits
//!
//! The coordinator depends on these traits, not on a concrete backend. All
//! status transitions are expressed as "set to X only if currently Y" and
//! performed atomically by the backend; a losing concurrent caller gets
//! `StateConflict` back, never a silently overwritten record.

use async_trait::async_trait;
use evidia_core::models::{Attachment, MediaCounters, NewAttachment, TransferFields};
use evidia_core::AppError;
use uuid::Uuid;

/// Durable storage of attachment records and their lifecycle.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Create a pending record with an `initiated` provenance fact.
    /// Fails with `NotFound` if the owning report does not exist.
    async fn insert(&self, new: NewAttachment) -> Result<Attachment, AppError>;

    /// Fetch a record by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Attachment>, AppError>;

    /// Atomically transition pending -> processing, filling the transfer
    /// fields and appending an `uploaded` fact. The write is conditional on
    /// the record still being pending; any other current state yields
    /// `StateConflict` (or `NotFound` for a missing record) with nothing
    /// mutated.
    async fn begin_transfer(
        &self,
        id: Uuid,
        fields: TransferFields,
    ) -> Result<Attachment, AppError>;

    /// Atomically transition processing -> completed, appending a `completed`
    /// fact. Conditional on the record being processing.
    async fn complete(&self, id: Uuid) -> Result<Attachment, AppError>;

    /// Atomically transition pending/processing -> failed, appending an
    /// `error` fact with the given kind and message. Losing this race to a
    /// terminal state is not an error: the record already carries its outcome.
    async fn mark_failed(&self, id: Uuid, kind: &str, message: &str) -> Result<(), AppError>;

    /// All completed attachments of one report, oldest first.
    async fn list_completed(&self, report_id: Uuid) -> Result<Vec<Attachment>, AppError>;
}

/// The slice of the report aggregate this pipeline writes: the three derived
/// media counters.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn exists(&self, report_id: Uuid) -> Result<bool, AppError>;

    /// Persist recomputed counters with a full overwrite, never an increment.
    async fn set_media_counters(
        &self,
        report_id: Uuid,
        counters: MediaCounters,
    ) -> Result<(), AppError>;
}
