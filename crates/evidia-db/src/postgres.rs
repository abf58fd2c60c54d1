//! Postgres-backed record stores.
//!
//! Uses dynamic sqlx queries to avoid requiring DATABASE_URL/sqlx prepare.
//! Status transitions are single conditional UPDATEs: the WHERE clause carries
//! the required current status, and zero affected rows means the caller lost
//! the race (or the record never existed). Provenance is a JSONB array and only
//! ever grows via `provenance || $n`.

use evidia_core::models::{
    Attachment, AttachmentStatus, MediaCounters, NewAttachment, ProvenanceEvent, ProvenanceFact,
    TransferFields,
};
use evidia_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{AttachmentStore, ReportStore};

const ATTACHMENT_COLUMNS: &str = "id, report_id, attachment_type, position, filename, \
     original_name, path, url, mime_type, size, checksum, status, provenance, \
     created_at, updated_at";

/// Attachment record store over a Postgres pool.
#[derive(Clone)]
pub struct PgAttachmentStore {
    pool: PgPool,
}

impl PgAttachmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Disambiguate a conditional update that affected zero rows: either the
    /// record does not exist, or it is not in the state the phase requires.
    async fn conflict_for(&self, id: Uuid, expected: AttachmentStatus) -> AppError {
        match self.get(id).await {
            Ok(Some(current)) => AppError::StateConflict {
                attachment_id: id,
                expected,
                actual: current.status,
            },
            Ok(None) => AppError::NotFound(format!("Attachment {} not found", id)),
            Err(err) => err,
        }
    }
}

fn fact_json(fact: &ProvenanceFact) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(fact)
        .map_err(|e| AppError::Internal(format!("Failed to encode provenance fact: {}", e)))
}

#[async_trait::async_trait]
impl AttachmentStore for PgAttachmentStore {
    async fn insert(&self, new: NewAttachment) -> Result<Attachment, AppError> {
        // Explicit existence check for a clean NotFound; the FK still backs it.
        let report_exists = sqlx::query("SELECT 1 FROM reports WHERE id = $1")
            .bind(new.report_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if !report_exists {
            return Err(AppError::NotFound(format!(
                "Report {} not found",
                new.report_id
            )));
        }

        let initiated = fact_json(&ProvenanceFact::now(ProvenanceEvent::Initiated))?;
        let attachment = sqlx::query_as::<_, Attachment>(&format!(
            r#"
            INSERT INTO attachments (
                id, report_id, attachment_type, position, size, checksum,
                status, provenance
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, jsonb_build_array($8::jsonb))
            RETURNING {ATTACHMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.report_id)
        .bind(new.attachment_type)
        .bind(new.position)
        .bind(new.size)
        .bind(new.checksum)
        .bind(AttachmentStatus::Pending)
        .bind(initiated)
        .fetch_one(&self.pool)
        .await?;

        Ok(attachment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Attachment>, AppError> {
        let row = sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn begin_transfer(
        &self,
        id: Uuid,
        fields: TransferFields,
    ) -> Result<Attachment, AppError> {
        let uploaded = fact_json(&ProvenanceFact::now(ProvenanceEvent::Uploaded))?;
        let updated = sqlx::query_as::<_, Attachment>(&format!(
            r#"
            UPDATE attachments
            SET status = $2, filename = $3, original_name = $4, path = $5,
                url = $6, mime_type = $7, provenance = provenance || $8::jsonb,
                updated_at = NOW()
            WHERE id = $1 AND status = $9
            RETURNING {ATTACHMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(AttachmentStatus::Processing)
        .bind(fields.filename)
        .bind(fields.original_name)
        .bind(fields.path)
        .bind(fields.url)
        .bind(fields.mime_type)
        .bind(uploaded)
        .bind(AttachmentStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(attachment) => Ok(attachment),
            None => Err(self.conflict_for(id, AttachmentStatus::Pending).await),
        }
    }

    async fn complete(&self, id: Uuid) -> Result<Attachment, AppError> {
        let completed = fact_json(&ProvenanceFact::now(ProvenanceEvent::Completed))?;
        let updated = sqlx::query_as::<_, Attachment>(&format!(
            r#"
            UPDATE attachments
            SET status = $2, provenance = provenance || $3::jsonb, updated_at = NOW()
            WHERE id = $1 AND status = $4
            RETURNING {ATTACHMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(AttachmentStatus::Completed)
        .bind(completed)
        .bind(AttachmentStatus::Processing)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(attachment) => Ok(attachment),
            None => Err(self.conflict_for(id, AttachmentStatus::Processing).await),
        }
    }

    async fn mark_failed(&self, id: Uuid, kind: &str, message: &str) -> Result<(), AppError> {
        let error_fact = fact_json(&ProvenanceFact::now(ProvenanceEvent::Error {
            kind: kind.to_string(),
            message: message.to_string(),
        }))?;
        let result = sqlx::query(
            r#"
            UPDATE attachments
            SET status = $2, provenance = provenance || $3::jsonb, updated_at = NOW()
            WHERE id = $1 AND (status = $4 OR status = $5)
            "#,
        )
        .bind(id)
        .bind(AttachmentStatus::Failed)
        .bind(error_fact)
        .bind(AttachmentStatus::Pending)
        .bind(AttachmentStatus::Processing)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Already terminal (or missing); the record keeps its outcome.
            tracing::debug!(attachment_id = %id, kind, "mark_failed hit a terminal record");
        }
        Ok(())
    }

    async fn list_completed(&self, report_id: Uuid) -> Result<Vec<Attachment>, AppError> {
        let rows = sqlx::query_as::<_, Attachment>(&format!(
            r#"
            SELECT {ATTACHMENT_COLUMNS}
            FROM attachments
            WHERE report_id = $1 AND status = $2
            ORDER BY created_at
            "#
        ))
        .bind(report_id)
        .bind(AttachmentStatus::Completed)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// Report counter store over a Postgres pool.
#[derive(Clone)]
pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ReportStore for PgReportStore {
    async fn exists(&self, report_id: Uuid) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT 1 FROM reports WHERE id = $1")
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn set_media_counters(
        &self,
        report_id: Uuid,
        counters: MediaCounters,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE reports
            SET image_count = $2, has_audio = $3, has_video = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(report_id)
        .bind(counters.image_count)
        .bind(counters.has_audio)
        .bind(counters.has_video)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Report {} not found", report_id)));
        }
        Ok(())
    }
}
