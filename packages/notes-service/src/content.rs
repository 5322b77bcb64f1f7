use std::time::Duration;

use tokio::time::{self, Instant};
use uuid::Uuid;

use crate::{Error, NotesService, Result};
use notes_domain::content::{ContentKind, ExtractionStatus};
use notes_storage::{models::Note, queries};

impl NotesService {
	/// Loads a note only when it belongs to `owner_id`.
	pub(crate) async fn owned_note(&self, owner_id: Uuid, note_id: Uuid) -> Result<Note> {
		queries::fetch_note(&self.db.pool, owner_id, note_id)
			.await?
			.ok_or_else(|| Error::not_found("Note"))
	}

	/// Returns the text generation should work from.
	///
	/// Text notes use their own content. PDF notes use the extracted text, waiting up to
	/// `generation.extraction_wait_ms` for a pending extraction before giving up.
	pub(crate) async fn resolve_content(&self, note: &Note) -> Result<String> {
		match ContentKind::parse(&note.content_kind) {
			Some(ContentKind::Text) => note
				.content
				.as_deref()
				.map(str::trim)
				.filter(|text| !text.is_empty())
				.map(str::to_string)
				.ok_or_else(|| Error::validation("Note has no content.")),
			Some(ContentKind::Pdf) => self.wait_for_extraction(note.note_id).await,
			None => Err(Error::Storage {
				message: format!("Note has unknown content kind {}.", note.content_kind),
			}),
		}
	}

	async fn wait_for_extraction(&self, note_id: Uuid) -> Result<String> {
		let generation = &self.cfg.generation;
		let deadline = Instant::now() + Duration::from_millis(generation.extraction_wait_ms);
		let poll = Duration::from_millis(generation.extraction_poll_ms.max(1));

		loop {
			let row = queries::fetch_extraction(&self.db.pool, note_id).await?;
			let status = row.as_ref().and_then(|row| ExtractionStatus::parse(&row.status));

			match (status, row) {
				(Some(ExtractionStatus::Completed), Some(row)) => {
					return row
						.extracted_text
						.as_deref()
						.map(str::trim)
						.filter(|text| !text.is_empty())
						.map(str::to_string)
						.ok_or_else(|| Error::validation("Extracted text is empty."));
				},
				(Some(ExtractionStatus::Failed), Some(row)) => {
					return Err(Error::ExtractionFailed {
						note_id,
						message: row
							.error_message
							.unwrap_or_else(|| "Extraction failed.".to_string()),
					});
				},
				_ => {},
			}

			let now = Instant::now();

			if now >= deadline {
				return Err(Error::ExtractionPending { note_id });
			}

			time::sleep(poll.min(deadline - now)).await;
		}
	}
}
