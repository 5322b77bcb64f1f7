use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, NotesService, Result};
use notes_domain::{
	content::{ContentKind, ExtractionStatus},
	job::{JobKind, JobStatus},
};
use notes_storage::{
	jobs,
	models::{GenerationJob, Note, NoteListRow},
	queries,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateTextNoteRequest {
	pub owner_id: Uuid,
	pub title: String,
	pub content: String,
}

/// A PDF already written by the file-serving side, referenced by `file_ref`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisterPdfNoteRequest {
	pub owner_id: Uuid,
	pub title: String,
	pub file_ref: String,
	pub file_size: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateNoteTitleRequest {
	pub owner_id: Uuid,
	pub note_id: Uuid,
	pub title: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct NoteView {
	pub note_id: Uuid,
	pub title: String,
	pub content_kind: String,
	pub content: Option<String>,
	pub file_ref: Option<String>,
	pub file_size: i64,
	pub extraction_status: Option<String>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}
impl NoteView {
	fn from_row(note: Note, extraction_status: Option<String>) -> Self {
		Self {
			note_id: note.note_id,
			title: note.title,
			content_kind: note.content_kind,
			content: note.content,
			file_ref: note.file_ref,
			file_size: note.file_size,
			extraction_status,
			created_at: note.created_at,
			updated_at: note.updated_at,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct NoteListItem {
	pub note_id: Uuid,
	pub title: String,
	pub content_kind: String,
	pub file_size: i64,
	pub extraction_status: Option<String>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}
impl From<NoteListRow> for NoteListItem {
	fn from(row: NoteListRow) -> Self {
		Self {
			note_id: row.note_id,
			title: row.title,
			content_kind: row.content_kind,
			file_size: row.file_size,
			extraction_status: row.extraction_status,
			created_at: row.created_at,
			updated_at: row.updated_at,
		}
	}
}

impl NotesService {
	pub async fn create_text_note(&self, req: CreateTextNoteRequest) -> Result<NoteView> {
		let title = crate::required_text(&req.title, "title")?;
		let content = crate::required_text(&req.content, "content")?;
		let now = OffsetDateTime::now_utc();
		let note = Note {
			note_id: Uuid::new_v4(),
			owner_id: req.owner_id,
			title,
			content_kind: ContentKind::Text.as_str().to_string(),
			file_size: content.len() as i64,
			content: Some(content),
			file_ref: None,
			created_at: now,
			updated_at: now,
		};
		let mut tx = self.db.pool.begin().await?;

		queries::insert_note(&mut *tx, &note).await?;
		queries::insert_extraction(
			&mut *tx,
			note.note_id,
			ExtractionStatus::Completed.as_str(),
			note.content.as_deref(),
			now,
		)
		.await?;

		tx.commit().await?;

		tracing::info!(note_id = %note.note_id, "Created text note.");

		Ok(NoteView::from_row(note, Some(ExtractionStatus::Completed.as_str().to_string())))
	}

	/// Stores a PDF note and queues its text extraction.
	pub async fn register_pdf_note(&self, req: RegisterPdfNoteRequest) -> Result<NoteView> {
		let title = crate::required_text(&req.title, "title")?;
		let file_ref = crate::required_text(&req.file_ref, "file_ref")?;

		if req.file_size < 0 {
			return Err(Error::validation("file_size must be zero or greater."));
		}

		let now = OffsetDateTime::now_utc();
		let note = Note {
			note_id: Uuid::new_v4(),
			owner_id: req.owner_id,
			title,
			content_kind: ContentKind::Pdf.as_str().to_string(),
			content: None,
			file_ref: Some(file_ref),
			file_size: req.file_size,
			created_at: now,
			updated_at: now,
		};
		let mut tx = self.db.pool.begin().await?;

		queries::insert_note(&mut *tx, &note).await?;
		queries::insert_extraction(
			&mut *tx,
			note.note_id,
			ExtractionStatus::Pending.as_str(),
			None,
			now,
		)
		.await?;
		jobs::insert_job(&mut *tx, &pending_job(&note, JobKind::Extract, now)).await?;

		tx.commit().await?;

		tracing::info!(note_id = %note.note_id, "Registered PDF note.");

		Ok(NoteView::from_row(note, Some(ExtractionStatus::Pending.as_str().to_string())))
	}

	/// Newest first.
	pub async fn list_notes(&self, owner_id: Uuid) -> Result<Vec<NoteListItem>> {
		let rows = queries::list_notes(&self.db.pool, owner_id).await?;

		Ok(rows.into_iter().map(NoteListItem::from).collect())
	}

	pub async fn get_note(&self, owner_id: Uuid, note_id: Uuid) -> Result<NoteView> {
		let note = self.owned_note(owner_id, note_id).await?;
		let extraction = queries::fetch_extraction(&self.db.pool, note_id).await?;

		Ok(NoteView::from_row(note, extraction.map(|row| row.status)))
	}

	/// Only the title of a note may change after it is stored.
	pub async fn update_note_title(&self, req: UpdateNoteTitleRequest) -> Result<NoteView> {
		let title = crate::required_text(&req.title, "title")?;
		let now = OffsetDateTime::now_utc();
		let updated =
			queries::update_note_title(&self.db.pool, req.owner_id, req.note_id, &title, now)
				.await?;

		if updated == 0 {
			return Err(Error::not_found("Note"));
		}

		self.get_note(req.owner_id, req.note_id).await
	}

	/// Removes the note together with its artifacts, conversations, and jobs.
	pub async fn delete_note(&self, owner_id: Uuid, note_id: Uuid) -> Result<()> {
		let deleted = queries::delete_note(&self.db.pool, owner_id, note_id).await?;

		if deleted == 0 {
			return Err(Error::not_found("Note"));
		}

		tracing::info!(note_id = %note_id, "Deleted note.");

		Ok(())
	}
}

pub(crate) fn pending_job(note: &Note, kind: JobKind, now: OffsetDateTime) -> GenerationJob {
	GenerationJob {
		job_id: Uuid::new_v4(),
		owner_id: note.owner_id,
		note_id: note.note_id,
		kind: kind.as_str().to_string(),
		status: JobStatus::Pending.as_str().to_string(),
		artifact_id: None,
		error_code: None,
		error_message: None,
		lease_until: None,
		created_at: now,
		updated_at: now,
	}
}
