use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Note {
	pub note_id: Uuid,
	pub owner_id: Uuid,
	pub title: String,
	pub content_kind: String,
	pub content: Option<String>,
	pub file_ref: Option<String>,
	pub file_size: i64,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct NoteListRow {
	pub note_id: Uuid,
	pub title: String,
	pub content_kind: String,
	pub file_size: i64,
	pub extraction_status: Option<String>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ExtractedContent {
	pub note_id: Uuid,
	pub extracted_text: Option<String>,
	pub status: String,
	pub error_message: Option<String>,
	pub extracted_at: Option<OffsetDateTime>,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct PendingExtraction {
	pub note_id: Uuid,
	pub owner_id: Uuid,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Summary {
	pub summary_id: Uuid,
	pub note_id: Uuid,
	pub owner_id: Uuid,
	pub content: String,
	pub ai_model: String,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Quiz {
	pub quiz_id: Uuid,
	pub note_id: Uuid,
	pub owner_id: Uuid,
	pub title: String,
	pub questions: Value,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct QuizAttempt {
	pub attempt_id: Uuid,
	pub quiz_id: Uuid,
	pub owner_id: Uuid,
	pub answers: Value,
	pub score: i32,
	pub total_questions: i32,
	pub time_taken_seconds: Option<i32>,
	pub completed_at: OffsetDateTime,
}

/// An attempt joined with the titles of its quiz and note.
#[derive(Debug, sqlx::FromRow)]
pub struct AttemptReportRow {
	pub attempt_id: Uuid,
	pub quiz_id: Uuid,
	pub note_id: Option<Uuid>,
	pub quiz_title: Option<String>,
	pub note_title: Option<String>,
	pub score: i32,
	pub total_questions: i32,
	pub time_taken_seconds: Option<i32>,
	pub completed_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Conversation {
	pub conversation_id: Uuid,
	pub note_id: Uuid,
	pub owner_id: Uuid,
	pub title: String,
	pub is_active: bool,
	pub started_at: OffsetDateTime,
	pub last_activity: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ConversationSummary {
	pub conversation_id: Uuid,
	pub note_id: Uuid,
	pub title: String,
	pub started_at: OffsetDateTime,
	pub last_activity: OffsetDateTime,
	pub message_count: i64,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Message {
	pub message_id: Uuid,
	pub seq: i64,
	pub conversation_id: Uuid,
	pub role: String,
	pub content: String,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct GenerationJob {
	pub job_id: Uuid,
	pub owner_id: Uuid,
	pub note_id: Uuid,
	pub kind: String,
	pub status: String,
	pub artifact_id: Option<Uuid>,
	pub error_code: Option<String>,
	pub error_message: Option<String>,
	pub lease_until: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
