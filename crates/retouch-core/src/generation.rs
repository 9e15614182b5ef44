//! Generation record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{GenerationId, UserId};

/// A persisted record of one generation request.
///
/// Records are written once, after the pipeline outcome is known, and are
/// never updated afterwards. A `Completed` record always carries both image
/// URLs and corresponds to exactly one debited transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    /// Unique record ID (ULID for time-ordering).
    pub id: GenerationId,

    /// The user who requested the generation.
    pub user_id: UserId,

    /// The user's requested change.
    pub prompt: String,

    /// Durable URL of the uploaded original image.
    pub original_image_url: Option<String>,

    /// Durable URL of the uploaded generated image.
    pub generated_image_url: Option<String>,

    /// Vision-model analysis of the original image.
    pub analysis: Option<String>,

    /// Advisory similar-objects text, best-effort.
    pub similar_objects: Option<String>,

    /// Outcome of the pipeline run.
    pub status: GenerationStatus,

    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl GenerationRecord {
    /// Create a completed record with both artifact URLs set.
    #[must_use]
    pub fn completed(
        user_id: UserId,
        prompt: impl Into<String>,
        original_image_url: String,
        generated_image_url: String,
        analysis: String,
        similar_objects: Option<String>,
    ) -> Self {
        Self {
            id: GenerationId::generate(),
            user_id,
            prompt: prompt.into(),
            original_image_url: Some(original_image_url),
            generated_image_url: Some(generated_image_url),
            analysis: Some(analysis),
            similar_objects,
            status: GenerationStatus::Completed,
            created_at: Utc::now(),
        }
    }

    /// Create a failed record for audit purposes.
    #[must_use]
    pub fn failed(user_id: UserId, prompt: impl Into<String>) -> Self {
        Self {
            id: GenerationId::generate(),
            user_id,
            prompt: prompt.into(),
            original_image_url: None,
            generated_image_url: None,
            analysis: None,
            similar_objects: None,
            status: GenerationStatus::Failed,
            created_at: Utc::now(),
        }
    }
}

/// Status of a generation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Accepted but not yet resolved.
    Pending,

    /// Pipeline and persistence both succeeded.
    Completed,

    /// Pipeline or persistence failed; no artifacts were kept.
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_record_has_both_urls() {
        let record = GenerationRecord::completed(
            UserId::generate(),
            "make the sky purple",
            "https://cdn.example.com/u/original_1.jpg".into(),
            "https://cdn.example.com/u/generated_1.jpg".into(),
            "A landscape".into(),
            None,
        );

        assert_eq!(record.status, GenerationStatus::Completed);
        assert!(record.original_image_url.is_some());
        assert!(record.generated_image_url.is_some());
    }

    #[test]
    fn failed_record_has_no_artifacts() {
        let record = GenerationRecord::failed(UserId::generate(), "prompt");
        assert_eq!(record.status, GenerationStatus::Failed);
        assert!(record.original_image_url.is_none());
        assert!(record.generated_image_url.is_none());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&GenerationStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
