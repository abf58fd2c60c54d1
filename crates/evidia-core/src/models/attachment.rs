use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Attachment media type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "attachment_type", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentType {
    Image,
    Audio,
    Video,
}

impl AttachmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentType::Image => "image",
            AttachmentType::Audio => "audio",
            AttachmentType::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(AttachmentType::Image),
            "audio" => Some(AttachmentType::Audio),
            "video" => Some(AttachmentType::Video),
            _ => None,
        }
    }
}

impl std::fmt::Display for AttachmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attachment lifecycle status.
///
/// Legal edges: pending -> processing -> completed, and pending/processing ->
/// failed. Completed and failed are terminal. Every status write in the store
/// layer is conditional on the current status, so an illegal edge can never be
/// persisted even under concurrent callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "attachment_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AttachmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentStatus::Pending => "pending",
            AttachmentStatus::Processing => "processing",
            AttachmentStatus::Completed => "completed",
            AttachmentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AttachmentStatus::Pending),
            "processing" => Some(AttachmentStatus::Processing),
            "completed" => Some(AttachmentStatus::Completed),
            "failed" => Some(AttachmentStatus::Failed),
            _ => None,
        }
    }

    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttachmentStatus::Completed | AttachmentStatus::Failed)
    }

    /// Whether `self -> next` is a legal edge of the lifecycle state machine.
    pub fn can_transition_to(&self, next: AttachmentStatus) -> bool {
        use AttachmentStatus::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Processing, Completed) | (Pending, Failed) | (Processing, Failed)
        )
    }
}

impl std::fmt::Display for AttachmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped lifecycle event in an attachment's audit trail.
///
/// Provenance is append-only: facts are pushed, never overwritten, so the
/// record's history stays complete even for failed attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProvenanceFact {
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: ProvenanceEvent,
}

impl ProvenanceFact {
    pub fn now(event: ProvenanceEvent) -> Self {
        Self {
            recorded_at: Utc::now(),
            event,
        }
    }
}

/// Lifecycle event kinds recorded in provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProvenanceEvent {
    Initiated,
    Uploaded,
    Completed,
    Error { kind: String, message: String },
}

/// One binary media asset belonging to exactly one report.
///
/// Transfer fields (`filename`, `original_name`, `path`, `url`, `mime_type`)
/// are populated if and only if status is processing or completed. Records are
/// never deleted by the pipeline; failed rows are retained as an audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Attachment {
    pub id: Uuid,
    pub report_id: Uuid,
    pub attachment_type: AttachmentType,
    /// Display order, images only (1..=3).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Byte length declared by the caller at initiation. Advisory: not
    /// re-verified against the transferred bytes.
    pub size: i64,
    /// Caller-supplied or server-generated content hash. Provenance only,
    /// not integrity enforcement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub status: AttachmentStatus,
    pub provenance: Vec<ProvenanceFact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(feature = "sqlx")]
impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for Attachment {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        let provenance: serde_json::Value = row.try_get("provenance")?;
        let provenance: Vec<ProvenanceFact> =
            serde_json::from_value(provenance).map_err(|e| sqlx::Error::ColumnDecode {
                index: "provenance".to_string(),
                source: Box::new(e),
            })?;
        Ok(Attachment {
            id: row.try_get("id")?,
            report_id: row.try_get("report_id")?,
            attachment_type: row.try_get("attachment_type")?,
            position: row.try_get("position")?,
            filename: row.try_get("filename")?,
            original_name: row.try_get("original_name")?,
            path: row.try_get("path")?,
            url: row.try_get("url")?,
            mime_type: row.try_get("mime_type")?,
            size: row.try_get("size")?,
            checksum: row.try_get("checksum")?,
            status: row.try_get("status")?,
            provenance,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Fields required to create a pending attachment record.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub report_id: Uuid,
    pub attachment_type: AttachmentType,
    pub position: Option<i16>,
    pub size: i64,
    pub checksum: Option<String>,
}

/// Transfer-phase fields written alongside the pending -> processing transition.
#[derive(Debug, Clone)]
pub struct TransferFields {
    pub filename: String,
    pub original_name: String,
    pub path: String,
    pub url: String,
    pub mime_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        use AttachmentStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Failed));
    }

    #[test]
    fn test_illegal_transitions() {
        use AttachmentStatus::*;
        for terminal in [Completed, Failed] {
            for next in [Pending, Processing, Completed, Failed] {
                assert!(!terminal.can_transition_to(next));
            }
            assert!(terminal.is_terminal());
        }
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Processing.can_transition_to(Processing));
    }

    #[test]
    fn test_provenance_event_serialization() {
        let fact = ProvenanceFact::now(ProvenanceEvent::Error {
            kind: "remote_timeout".to_string(),
            message: "30s elapsed".to_string(),
        });
        let json = serde_json::to_value(&fact).unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["kind"], "remote_timeout");
        assert!(json["recorded_at"].is_string());

        let back: ProvenanceFact = serde_json::from_value(json).unwrap();
        assert_eq!(back, fact);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            AttachmentStatus::Pending,
            AttachmentStatus::Processing,
            AttachmentStatus::Completed,
            AttachmentStatus::Failed,
        ] {
            assert_eq!(AttachmentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AttachmentStatus::parse("bogus"), None);
    }
}
