use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Attachment, AttachmentType};

/// Derived media counters on the owning report.
///
/// Always a pure function of the report's completed attachments at the time of
/// last reconciliation: a cache, not a source of truth. Reconciliation writes
/// them with a full overwrite, never an increment, so any prior drift
/// self-heals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct MediaCounters {
    pub image_count: i32,
    pub has_audio: bool,
    pub has_video: bool,
}

impl MediaCounters {
    /// Compute counters from a report's completed attachments.
    pub fn from_completed<'a>(attachments: impl IntoIterator<Item = &'a Attachment>) -> Self {
        let mut counters = MediaCounters::default();
        for attachment in attachments {
            match attachment.attachment_type {
                AttachmentType::Image => counters.image_count += 1,
                AttachmentType::Audio => counters.has_audio = true,
                AttachmentType::Video => counters.has_video = true,
            }
        }
        counters
    }
}
