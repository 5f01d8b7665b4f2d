use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One uploaded lecture recording plus its transcript, as the upstream
/// returns it inside the envelope's `data`. `content` stays empty while
/// transcription is still running. Timestamps arrive without an offset
/// from the upstream's serializer, hence the naive type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LectureSession {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub teacher_name: Option<String>,
    pub language: String,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: Uuid,
    #[serde(default)]
    pub session_id: Option<Uuid>,
    pub summary_text: String,
}

/// The upstream is inconsistent about this shape: the list endpoint says
/// `targetLanguage`, the by-id and create endpoints say `language`, and
/// `content` only appears once the translation is materialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTranslation {
    pub id: Uuid,
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(default, alias = "language")]
    pub target_language: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}
