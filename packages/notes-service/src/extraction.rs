use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, MAX_ERROR_MESSAGE_CHARS, NotesService, Result};
use notes_domain::{
	content::{ContentKind, ExtractionStatus},
	job::JobKind,
	redact,
};
use notes_providers::{Operation, envelope};
use notes_storage::{jobs, models::Note, queries};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtractionOutcome {
	Completed { text: String },
	Failed { message: String },
}

#[derive(Clone, Debug, Serialize)]
pub struct BackfillReport {
	pub scanned: u32,
	pub enqueued: u32,
}

impl NotesService {
	/// Records the result of extracting a PDF note.
	///
	/// Returns `false` when the note's extraction had already completed; completed text is
	/// never replaced.
	pub async fn record_extraction(&self, note_id: Uuid, outcome: ExtractionOutcome) -> Result<bool> {
		let now = OffsetDateTime::now_utc();
		let updated = match &outcome {
			ExtractionOutcome::Completed { text } =>
				queries::complete_extraction(&self.db.pool, note_id, text, now).await?,
			ExtractionOutcome::Failed { message } => {
				let message = redact::sanitize_error_text(message, MAX_ERROR_MESSAGE_CHARS);

				queries::fail_extraction(&self.db.pool, note_id, &message, now).await?
			},
		};

		if updated == 0 {
			tracing::debug!(note_id = %note_id, "Ignored extraction outcome for a settled note.");
		}

		Ok(updated > 0)
	}

	/// Queues extraction for every PDF note whose text is missing or failed to extract.
	pub async fn backfill_extractions(&self) -> Result<BackfillReport> {
		let pending = queries::list_pdf_notes_needing_extraction(&self.db.pool).await?;
		let mut report = BackfillReport { scanned: pending.len() as u32, enqueued: 0 };

		for row in pending {
			let now = OffsetDateTime::now_utc();
			let Some(note) = queries::fetch_note(&self.db.pool, row.owner_id, row.note_id).await?
			else {
				continue;
			};
			let mut tx = self.db.pool.begin().await?;

			queries::insert_extraction(
				&mut *tx,
				note.note_id,
				ExtractionStatus::Pending.as_str(),
				None,
				now,
			)
			.await?;

			if jobs::insert_job(&mut *tx, &crate::notes::pending_job(&note, JobKind::Extract, now))
				.await?
			{
				report.enqueued += 1;
			}

			tx.commit().await?;
		}

		tracing::info!(scanned = report.scanned, enqueued = report.enqueued, "Extraction backfill finished.");

		Ok(report)
	}

	/// Asks the collaborator for a PDF note's text and records the outcome either way.
	pub(crate) async fn extract_note(&self, note: &Note) -> Result<()> {
		if ContentKind::parse(&note.content_kind) != Some(ContentKind::Pdf) {
			return Err(Error::validation("Only PDF notes need extraction."));
		}

		let payload = serde_json::json!({
			"file_ref": note.file_ref,
			"title": note.title,
		});
		let extracted = match self.call_collaborator(Operation::Extract, note.note_id, payload).await {
			Ok(reply) => envelope::extracted_text(&reply).map_err(Error::from),
			Err(err) => Err(err),
		};

		match extracted {
			Ok(text) => {
				self.record_extraction(note.note_id, ExtractionOutcome::Completed { text }).await?;

				tracing::info!(note_id = %note.note_id, "Extracted note text.");

				Ok(())
			},
			Err(err) => {
				self.record_extraction(
					note.note_id,
					ExtractionOutcome::Failed { message: err.to_string() },
				)
				.await?;

				Err(err)
			},
		}
	}
}
