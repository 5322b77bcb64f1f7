use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	models::{
		AttemptReportRow, Conversation, ConversationSummary, ExtractedContent, Message, Note,
		NoteListRow, PendingExtraction, Quiz, QuizAttempt, Summary,
	},
};

pub async fn insert_note<'e, E>(executor: E, note: &Note) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO notes (
	note_id,
	owner_id,
	title,
	content_kind,
	content,
	file_ref,
	file_size,
	created_at,
	updated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)",
	)
	.bind(note.note_id)
	.bind(note.owner_id)
	.bind(note.title.as_str())
	.bind(note.content_kind.as_str())
	.bind(note.content.as_deref())
	.bind(note.file_ref.as_deref())
	.bind(note.file_size)
	.bind(note.created_at)
	.bind(note.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn fetch_note<'e, E>(executor: E, owner_id: Uuid, note_id: Uuid) -> Result<Option<Note>>
where
	E: PgExecutor<'e>,
{
	let note = sqlx::query_as::<_, Note>(
		"SELECT * FROM notes WHERE note_id = $1 AND owner_id = $2",
	)
	.bind(note_id)
	.bind(owner_id)
	.fetch_optional(executor)
	.await?;

	Ok(note)
}

pub async fn list_notes<'e, E>(executor: E, owner_id: Uuid) -> Result<Vec<NoteListRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, NoteListRow>(
		"\
SELECT
	n.note_id,
	n.title,
	n.content_kind,
	n.file_size,
	e.status AS extraction_status,
	n.created_at,
	n.updated_at
FROM notes n
LEFT JOIN extracted_content e ON e.note_id = n.note_id
WHERE n.owner_id = $1
ORDER BY n.created_at DESC, n.note_id",
	)
	.bind(owner_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn update_note_title<'e, E>(
	executor: E,
	owner_id: Uuid,
	note_id: Uuid,
	title: &str,
	now: OffsetDateTime,
) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"UPDATE notes SET title = $1, updated_at = $2 WHERE note_id = $3 AND owner_id = $4",
	)
	.bind(title)
	.bind(now)
	.bind(note_id)
	.bind(owner_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}

pub async fn delete_note<'e, E>(executor: E, owner_id: Uuid, note_id: Uuid) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM notes WHERE note_id = $1 AND owner_id = $2")
		.bind(note_id)
		.bind(owner_id)
		.execute(executor)
		.await?;

	Ok(result.rows_affected())
}

pub async fn insert_extraction<'e, E>(
	executor: E,
	note_id: Uuid,
	status: &str,
	extracted_text: Option<&str>,
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	let extracted_at = (status == "completed").then_some(now);

	sqlx::query(
		"\
INSERT INTO extracted_content (note_id, extracted_text, status, error_message, extracted_at, updated_at)
VALUES ($1,$2,$3,NULL,$4,$5)
ON CONFLICT (note_id) DO UPDATE
SET status = EXCLUDED.status,
	extracted_text = EXCLUDED.extracted_text,
	error_message = NULL,
	extracted_at = EXCLUDED.extracted_at,
	updated_at = EXCLUDED.updated_at
WHERE extracted_content.status <> 'completed'",
	)
	.bind(note_id)
	.bind(extracted_text)
	.bind(status)
	.bind(extracted_at)
	.bind(now)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn fetch_extraction<'e, E>(executor: E, note_id: Uuid) -> Result<Option<ExtractedContent>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, ExtractedContent>(
		"SELECT * FROM extracted_content WHERE note_id = $1",
	)
	.bind(note_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

/// Completed extractions are final; later outcomes for the same note are ignored.
pub async fn complete_extraction<'e, E>(
	executor: E,
	note_id: Uuid,
	extracted_text: &str,
	now: OffsetDateTime,
) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE extracted_content
SET status = 'completed',
	extracted_text = $1,
	error_message = NULL,
	extracted_at = $2,
	updated_at = $2
WHERE note_id = $3 AND status <> 'completed'",
	)
	.bind(extracted_text)
	.bind(now)
	.bind(note_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}

pub async fn fail_extraction<'e, E>(
	executor: E,
	note_id: Uuid,
	error_message: &str,
	now: OffsetDateTime,
) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE extracted_content
SET status = 'failed',
	error_message = $1,
	updated_at = $2
WHERE note_id = $3 AND status <> 'completed'",
	)
	.bind(error_message)
	.bind(now)
	.bind(note_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}

pub async fn list_pdf_notes_needing_extraction<'e, E>(executor: E) -> Result<Vec<PendingExtraction>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, PendingExtraction>(
		"\
SELECT n.note_id, n.owner_id
FROM notes n
LEFT JOIN extracted_content e ON e.note_id = n.note_id
WHERE n.content_kind = 'pdf'
	AND (e.note_id IS NULL OR e.status <> 'completed')
ORDER BY n.created_at ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn fetch_summary<'e, E>(
	executor: E,
	owner_id: Uuid,
	note_id: Uuid,
) -> Result<Option<Summary>>
where
	E: PgExecutor<'e>,
{
	let summary = sqlx::query_as::<_, Summary>(
		"SELECT * FROM summaries WHERE note_id = $1 AND owner_id = $2",
	)
	.bind(note_id)
	.bind(owner_id)
	.fetch_optional(executor)
	.await?;

	Ok(summary)
}

/// Inserts the summary unless one already exists for the note and owner.
///
/// Returns `None` when another writer won the race; the caller reads the stored row.
pub async fn insert_summary_if_absent<'e, E>(executor: E, summary: &Summary) -> Result<Option<Summary>>
where
	E: PgExecutor<'e>,
{
	let inserted = sqlx::query_as::<_, Summary>(
		"\
INSERT INTO summaries (summary_id, note_id, owner_id, content, ai_model, created_at)
VALUES ($1,$2,$3,$4,$5,$6)
ON CONFLICT (note_id, owner_id) DO NOTHING
RETURNING *",
	)
	.bind(summary.summary_id)
	.bind(summary.note_id)
	.bind(summary.owner_id)
	.bind(summary.content.as_str())
	.bind(summary.ai_model.as_str())
	.bind(summary.created_at)
	.fetch_optional(executor)
	.await?;

	Ok(inserted)
}

pub async fn insert_quiz<'e, E>(executor: E, quiz: &Quiz) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO quizzes (quiz_id, note_id, owner_id, title, questions, created_at)
VALUES ($1,$2,$3,$4,$5,$6)",
	)
	.bind(quiz.quiz_id)
	.bind(quiz.note_id)
	.bind(quiz.owner_id)
	.bind(quiz.title.as_str())
	.bind(&quiz.questions)
	.bind(quiz.created_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn fetch_quiz<'e, E>(executor: E, owner_id: Uuid, quiz_id: Uuid) -> Result<Option<Quiz>>
where
	E: PgExecutor<'e>,
{
	let quiz = sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE quiz_id = $1 AND owner_id = $2")
		.bind(quiz_id)
		.bind(owner_id)
		.fetch_optional(executor)
		.await?;

	Ok(quiz)
}

pub async fn latest_quiz<'e, E>(executor: E, owner_id: Uuid, note_id: Uuid) -> Result<Option<Quiz>>
where
	E: PgExecutor<'e>,
{
	let quiz = sqlx::query_as::<_, Quiz>(
		"\
SELECT *
FROM quizzes
WHERE note_id = $1 AND owner_id = $2
ORDER BY created_at DESC, quiz_id DESC
LIMIT 1",
	)
	.bind(note_id)
	.bind(owner_id)
	.fetch_optional(executor)
	.await?;

	Ok(quiz)
}

pub async fn list_quizzes<'e, E>(executor: E, owner_id: Uuid, note_id: Uuid) -> Result<Vec<Quiz>>
where
	E: PgExecutor<'e>,
{
	let quizzes = sqlx::query_as::<_, Quiz>(
		"\
SELECT *
FROM quizzes
WHERE note_id = $1 AND owner_id = $2
ORDER BY created_at DESC, quiz_id DESC",
	)
	.bind(note_id)
	.bind(owner_id)
	.fetch_all(executor)
	.await?;

	Ok(quizzes)
}

pub async fn insert_attempt<'e, E>(executor: E, attempt: &QuizAttempt) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO quiz_attempts (
	attempt_id,
	quiz_id,
	owner_id,
	answers,
	score,
	total_questions,
	time_taken_seconds,
	completed_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8)",
	)
	.bind(attempt.attempt_id)
	.bind(attempt.quiz_id)
	.bind(attempt.owner_id)
	.bind(&attempt.answers)
	.bind(attempt.score)
	.bind(attempt.total_questions)
	.bind(attempt.time_taken_seconds)
	.bind(attempt.completed_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn fetch_attempt<'e, E>(
	executor: E,
	owner_id: Uuid,
	attempt_id: Uuid,
) -> Result<Option<QuizAttempt>>
where
	E: PgExecutor<'e>,
{
	let attempt = sqlx::query_as::<_, QuizAttempt>(
		"SELECT * FROM quiz_attempts WHERE attempt_id = $1 AND owner_id = $2",
	)
	.bind(attempt_id)
	.bind(owner_id)
	.fetch_optional(executor)
	.await?;

	Ok(attempt)
}

const ATTEMPT_REPORT_SELECT: &str = "\
SELECT
	a.attempt_id,
	a.quiz_id,
	q.note_id,
	q.title AS quiz_title,
	n.title AS note_title,
	a.score,
	a.total_questions,
	a.time_taken_seconds,
	a.completed_at
FROM quiz_attempts a
LEFT JOIN quizzes q ON q.quiz_id = a.quiz_id
LEFT JOIN notes n ON n.note_id = q.note_id";

pub async fn list_attempt_reports<'e, E>(executor: E, owner_id: Uuid) -> Result<Vec<AttemptReportRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"{ATTEMPT_REPORT_SELECT}\nWHERE a.owner_id = $1\nORDER BY a.completed_at DESC, a.attempt_id DESC"
	);
	let rows = sqlx::query_as::<_, AttemptReportRow>(&sql).bind(owner_id).fetch_all(executor).await?;

	Ok(rows)
}

pub async fn fetch_attempt_report<'e, E>(
	executor: E,
	owner_id: Uuid,
	attempt_id: Uuid,
) -> Result<Option<AttemptReportRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!("{ATTEMPT_REPORT_SELECT}\nWHERE a.attempt_id = $1 AND a.owner_id = $2");
	let row = sqlx::query_as::<_, AttemptReportRow>(&sql)
		.bind(attempt_id)
		.bind(owner_id)
		.fetch_optional(executor)
		.await?;

	Ok(row)
}

pub async fn insert_conversation<'e, E>(executor: E, conversation: &Conversation) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO conversations (
	conversation_id,
	note_id,
	owner_id,
	title,
	is_active,
	started_at,
	last_activity
)
VALUES ($1,$2,$3,$4,$5,$6,$7)",
	)
	.bind(conversation.conversation_id)
	.bind(conversation.note_id)
	.bind(conversation.owner_id)
	.bind(conversation.title.as_str())
	.bind(conversation.is_active)
	.bind(conversation.started_at)
	.bind(conversation.last_activity)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn fetch_conversation<'e, E>(
	executor: E,
	owner_id: Uuid,
	conversation_id: Uuid,
) -> Result<Option<Conversation>>
where
	E: PgExecutor<'e>,
{
	let conversation = sqlx::query_as::<_, Conversation>(
		"SELECT * FROM conversations WHERE conversation_id = $1 AND owner_id = $2",
	)
	.bind(conversation_id)
	.bind(owner_id)
	.fetch_optional(executor)
	.await?;

	Ok(conversation)
}

pub async fn list_recent_conversations<'e, E>(
	executor: E,
	owner_id: Uuid,
	note_id: Uuid,
	limit: i64,
) -> Result<Vec<ConversationSummary>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, ConversationSummary>(
		"\
SELECT
	c.conversation_id,
	c.note_id,
	c.title,
	c.started_at,
	c.last_activity,
	(SELECT count(*) FROM messages m WHERE m.conversation_id = c.conversation_id) AS message_count
FROM conversations c
WHERE c.note_id = $1 AND c.owner_id = $2 AND c.is_active
ORDER BY c.last_activity DESC, c.conversation_id DESC
LIMIT $3",
	)
	.bind(note_id)
	.bind(owner_id)
	.bind(limit)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn touch_conversation<'e, E>(
	executor: E,
	conversation_id: Uuid,
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"UPDATE conversations SET last_activity = GREATEST(last_activity, $1) WHERE conversation_id = $2",
	)
	.bind(now)
	.bind(conversation_id)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn archive_conversation<'e, E>(
	executor: E,
	owner_id: Uuid,
	conversation_id: Uuid,
) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"UPDATE conversations SET is_active = FALSE WHERE conversation_id = $1 AND owner_id = $2",
	)
	.bind(conversation_id)
	.bind(owner_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}

pub async fn insert_message<'e, E>(
	executor: E,
	conversation_id: Uuid,
	role: &str,
	content: &str,
	created_at: OffsetDateTime,
) -> Result<Message>
where
	E: PgExecutor<'e>,
{
	let message = sqlx::query_as::<_, Message>(
		"\
INSERT INTO messages (message_id, conversation_id, role, content, created_at)
VALUES ($1,$2,$3,$4,$5)
RETURNING *",
	)
	.bind(Uuid::new_v4())
	.bind(conversation_id)
	.bind(role)
	.bind(content)
	.bind(created_at)
	.fetch_one(executor)
	.await?;

	Ok(message)
}

pub async fn list_messages<'e, E>(executor: E, conversation_id: Uuid) -> Result<Vec<Message>>
where
	E: PgExecutor<'e>,
{
	let messages = sqlx::query_as::<_, Message>(
		"\
SELECT *
FROM messages
WHERE conversation_id = $1
ORDER BY created_at ASC, seq ASC",
	)
	.bind(conversation_id)
	.fetch_all(executor)
	.await?;

	Ok(messages)
}
