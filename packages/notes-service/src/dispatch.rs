//! Generation Dispatcher: turns a note into a stored summary or quiz.

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, NotesService, Result};
use notes_domain::{job::GenerationKind, quiz::Question};
use notes_providers::{Operation, envelope};
use notes_storage::{
	models::{Note, Quiz, Summary},
	queries,
};

#[derive(Clone, Debug, Serialize)]
pub struct SummaryView {
	pub summary_id: Uuid,
	pub note_id: Uuid,
	pub content: String,
	pub ai_model: String,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}
impl From<Summary> for SummaryView {
	fn from(row: Summary) -> Self {
		Self {
			summary_id: row.summary_id,
			note_id: row.note_id,
			content: row.content,
			ai_model: row.ai_model,
			created_at: row.created_at,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct QuizView {
	pub quiz_id: Uuid,
	pub note_id: Uuid,
	pub title: String,
	pub questions: Vec<Question>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}
impl QuizView {
	pub(crate) fn from_row(row: Quiz) -> Result<Self> {
		let questions = stored_questions(&row.questions)?;

		Ok(Self {
			quiz_id: row.quiz_id,
			note_id: row.note_id,
			title: row.title,
			questions,
			created_at: row.created_at,
		})
	}
}

/// A generated result derived from a note.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
	Summary(SummaryView),
	Quiz(QuizView),
}
impl Artifact {
	pub fn artifact_id(&self) -> Uuid {
		match self {
			Self::Summary(summary) => summary.summary_id,
			Self::Quiz(quiz) => quiz.quiz_id,
		}
	}
}

impl NotesService {
	/// Produces a summary or quiz for a note owned by `owner_id`.
	///
	/// A stored summary is returned as is and the collaborator is not called. Quizzes are
	/// generated on every call.
	pub async fn request_generation(
		&self,
		kind: GenerationKind,
		note_id: Uuid,
		owner_id: Uuid,
	) -> Result<Artifact> {
		let note = self.owned_note(owner_id, note_id).await?;

		match kind {
			GenerationKind::Summary => self.summarize(&note).await.map(Artifact::Summary),
			GenerationKind::Quiz => self.generate_quiz(&note).await.map(Artifact::Quiz),
		}
	}

	pub async fn get_summary(&self, owner_id: Uuid, note_id: Uuid) -> Result<SummaryView> {
		self.owned_note(owner_id, note_id).await?;

		queries::fetch_summary(&self.db.pool, owner_id, note_id)
			.await?
			.map(SummaryView::from)
			.ok_or_else(|| Error::not_found("Summary"))
	}

	pub async fn latest_quiz(&self, owner_id: Uuid, note_id: Uuid) -> Result<QuizView> {
		self.owned_note(owner_id, note_id).await?;

		let row = queries::latest_quiz(&self.db.pool, owner_id, note_id)
			.await?
			.ok_or_else(|| Error::not_found("Quiz"))?;

		QuizView::from_row(row)
	}

	pub async fn list_quizzes(&self, owner_id: Uuid, note_id: Uuid) -> Result<Vec<QuizView>> {
		self.owned_note(owner_id, note_id).await?;

		queries::list_quizzes(&self.db.pool, owner_id, note_id)
			.await?
			.into_iter()
			.map(QuizView::from_row)
			.collect()
	}

	pub(crate) async fn summarize(&self, note: &Note) -> Result<SummaryView> {
		if let Some(existing) =
			queries::fetch_summary(&self.db.pool, note.owner_id, note.note_id).await?
		{
			tracing::debug!(note_id = %note.note_id, "Reusing stored summary.");

			return Ok(existing.into());
		}

		let content = self.resolve_content(note).await?;
		let payload = serde_json::json!({
			"title": note.title,
			"content": content,
			"model": self.cfg.generation.summary_model,
		});
		let reply = self.call_collaborator(Operation::Summary, note.note_id, payload).await?;
		let generated = envelope::summary(&reply)?;
		let row = Summary {
			summary_id: Uuid::new_v4(),
			note_id: note.note_id,
			owner_id: note.owner_id,
			content: generated.content,
			ai_model: generated
				.ai_model
				.unwrap_or_else(|| self.cfg.generation.summary_model.clone()),
			created_at: OffsetDateTime::now_utc(),
		};

		if let Some(inserted) = queries::insert_summary_if_absent(&self.db.pool, &row).await? {
			tracing::info!(note_id = %note.note_id, summary_id = %inserted.summary_id, "Stored summary.");

			return Ok(inserted.into());
		}

		// A concurrent request stored its summary first; that row stays authoritative.
		queries::fetch_summary(&self.db.pool, note.owner_id, note.note_id)
			.await?
			.map(SummaryView::from)
			.ok_or_else(|| Error::Storage {
				message: "Summary disappeared after a conflicting insert.".to_string(),
			})
	}

	pub(crate) async fn generate_quiz(&self, note: &Note) -> Result<QuizView> {
		let content = self.resolve_content(note).await?;
		let payload = serde_json::json!({
			"title": note.title,
			"content": content,
			"question_count": self.cfg.generation.quiz_question_count,
		});
		let reply = self.call_collaborator(Operation::Quiz, note.note_id, payload).await?;
		let generated = envelope::quiz(&reply)?;
		let row = Quiz {
			quiz_id: Uuid::new_v4(),
			note_id: note.note_id,
			owner_id: note.owner_id,
			title: generated.title.unwrap_or_else(|| note.title.clone()),
			questions: serde_json::to_value(&generated.questions)?,
			created_at: OffsetDateTime::now_utc(),
		};

		queries::insert_quiz(&self.db.pool, &row).await?;

		tracing::info!(
			note_id = %note.note_id,
			quiz_id = %row.quiz_id,
			question_count = generated.questions.len(),
			"Stored quiz."
		);

		Ok(QuizView {
			quiz_id: row.quiz_id,
			note_id: row.note_id,
			title: row.title,
			questions: generated.questions,
			created_at: row.created_at,
		})
	}
}

pub(crate) fn stored_questions(raw: &Value) -> Result<Vec<Question>> {
	serde_json::from_value(raw.clone())
		.map_err(|err| Error::Storage { message: format!("Stored quiz is unreadable: {err}.") })
}
