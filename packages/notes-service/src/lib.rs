pub mod conversations;
pub mod dispatch;
pub mod extraction;
pub mod jobs;
pub mod notes;
pub mod quiz;

mod content;
mod error;

pub use conversations::{
	ConversationListItem, ConversationView, MessageView, PostMessageRequest, PostMessageResponse,
};
pub use dispatch::{Artifact, QuizView, SummaryView};
pub use error::{Error, GENERIC_FAILURE_MESSAGE, Result};
pub use extraction::{BackfillReport, ExtractionOutcome};
pub use jobs::JobView;
pub use notes::{
	CreateTextNoteRequest, NoteListItem, NoteView, RegisterPdfNoteRequest, UpdateNoteTitleRequest,
};
pub use quiz::{AttemptView, Report, ReportEntry, ScoreAttemptRequest};

use std::{future::Future, pin::Pin, sync::Arc, time::Instant};

use serde_json::{Map, Value};
use uuid::Uuid;

use notes_config::{Collaborator, Config};
use notes_providers::{CollaboratorRequest, Operation, envelope};
use notes_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Cap on collaborator error text stored with failed jobs and extractions.
pub const MAX_ERROR_MESSAGE_CHARS: usize = 1_024;

/// The out-of-process generator of summaries, quizzes, chat replies, and PDF text.
///
/// Implementations return the raw reply text; decoding happens in the service so every
/// transport shares one parser.
pub trait GenerationCollaborator
where
	Self: Send + Sync,
{
	fn invoke<'a>(
		&'a self,
		cfg: &'a Collaborator,
		request: &'a CollaboratorRequest,
	) -> BoxFuture<'a, notes_providers::Result<String>>;
}

struct DefaultCollaborator;
impl GenerationCollaborator for DefaultCollaborator {
	fn invoke<'a>(
		&'a self,
		cfg: &'a Collaborator,
		request: &'a CollaboratorRequest,
	) -> BoxFuture<'a, notes_providers::Result<String>> {
		Box::pin(notes_providers::invoke(cfg, request))
	}
}

pub struct NotesService {
	pub cfg: Config,
	pub db: Db,
	pub collaborator: Arc<dyn GenerationCollaborator>,
}
impl NotesService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db, collaborator: Arc::new(DefaultCollaborator) }
	}

	pub fn with_collaborator(
		cfg: Config,
		db: Db,
		collaborator: Arc<dyn GenerationCollaborator>,
	) -> Self {
		Self { cfg, db, collaborator }
	}

	/// Sends one request to the collaborator and returns its successful reply object.
	pub(crate) async fn call_collaborator(
		&self,
		operation: Operation,
		note_id: Uuid,
		payload: Value,
	) -> Result<Map<String, Value>> {
		let request = CollaboratorRequest { operation, note_id, payload };
		let started = Instant::now();
		let decoded = match self.collaborator.invoke(&self.cfg.collaborator, &request).await {
			Ok(raw) => envelope::decode(&raw),
			Err(err) => Err(err),
		};
		let elapsed_ms = started.elapsed().as_millis() as u64;

		match decoded {
			Ok(reply) => {
				tracing::debug!(
					operation = operation.as_str(),
					note_id = %note_id,
					elapsed_ms,
					"Collaborator replied."
				);

				Ok(reply)
			},
			Err(err) => {
				tracing::warn!(
					operation = operation.as_str(),
					note_id = %note_id,
					elapsed_ms,
					error = %err,
					"Collaborator call failed."
				);

				Err(err.into())
			},
		}
	}
}

/// Trims `value` and rejects it when nothing remains.
pub(crate) fn required_text(value: &str, field: &str) -> Result<String> {
	let trimmed = value.trim();

	if trimmed.is_empty() {
		return Err(Error::validation(format!("{field} is required.")));
	}

	Ok(trimmed.to_string())
}
