use uuid::Uuid;

pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed, please try again.";

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Invalid request: {message}")]
	Validation { message: String },
	#[error("Extraction for note {note_id} is still pending.")]
	ExtractionPending { note_id: Uuid },
	#[error("Extraction for note {note_id} failed: {message}")]
	ExtractionFailed { note_id: Uuid, message: String },
	#[error("Collaborator is unavailable: {message}")]
	CollaboratorUnavailable { message: String },
	#[error("Collaborator did not finish within {timeout_ms} ms.")]
	CollaboratorTimedOut { timeout_ms: u64 },
	#[error("Collaborator exited with code {code}: {stderr}")]
	CollaboratorNonZeroExit { code: i32, stderr: String },
	#[error("Collaborator output is malformed: {message}")]
	MalformedOutput { message: String },
	#[error("Collaborator reported failure: {message}")]
	CollaboratorReportedFailure { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	/// Stable code recorded on failed jobs.
	pub fn code(&self) -> &'static str {
		match self {
			Self::NotFound { .. } => "not_found",
			Self::Validation { .. } => "invalid_request",
			Self::ExtractionPending { .. } => "extraction_pending",
			Self::ExtractionFailed { .. } => "extraction_failed",
			Self::CollaboratorUnavailable { .. } => "collaborator_unavailable",
			Self::CollaboratorTimedOut { .. } => "collaborator_timed_out",
			Self::CollaboratorNonZeroExit { .. } => "collaborator_non_zero_exit",
			Self::MalformedOutput { .. } => "malformed_output",
			Self::CollaboratorReportedFailure { .. } => "collaborator_reported_failure",
			Self::Conflict { .. } => "conflict",
			Self::Storage { .. } => "storage",
		}
	}

	/// Text safe to show a caller. Collaborator and storage details stay in the server log.
	pub fn public_message(&self) -> String {
		match self {
			Self::NotFound { message } | Self::Validation { message } | Self::Conflict { message } =>
				message.clone(),
			Self::ExtractionPending { .. } =>
				"Note text is still being extracted, please try again shortly.".to_string(),
			Self::ExtractionFailed { .. } => "Text could not be extracted from this note.".to_string(),
			Self::CollaboratorUnavailable { .. }
			| Self::CollaboratorTimedOut { .. }
			| Self::CollaboratorNonZeroExit { .. }
			| Self::MalformedOutput { .. }
			| Self::CollaboratorReportedFailure { .. }
			| Self::Storage { .. } => GENERIC_FAILURE_MESSAGE.to_string(),
		}
	}

	pub(crate) fn not_found(what: &str) -> Self {
		Self::NotFound { message: format!("{what} not found.") }
	}

	pub(crate) fn validation(message: impl Into<String>) -> Self {
		Self::Validation { message: message.into() }
	}
}

impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<notes_storage::Error> for Error {
	fn from(err: notes_storage::Error) -> Self {
		match err {
			notes_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
		}
	}
}

impl From<notes_providers::Error> for Error {
	fn from(err: notes_providers::Error) -> Self {
		use notes_providers::Error as Provider;

		match err {
			Provider::Unavailable { message } => Self::CollaboratorUnavailable { message },
			Provider::TimedOut { timeout_ms } => Self::CollaboratorTimedOut { timeout_ms },
			Provider::NonZeroExit { code, stderr } => Self::CollaboratorNonZeroExit { code, stderr },
			Provider::MalformedOutput { message } => Self::MalformedOutput { message },
			Provider::ReportedFailure { message } => Self::CollaboratorReportedFailure { message },
			other @ (Provider::SerdeJson(_)
			| Provider::InvalidHeaderName(_)
			| Provider::InvalidHeaderValue(_)
			| Provider::InvalidConfig { .. }) =>
				Self::CollaboratorUnavailable { message: other.to_string() },
		}
	}
}

impl From<notes_domain::job::InvalidTransition> for Error {
	fn from(err: notes_domain::job::InvalidTransition) -> Self {
		Self::Conflict { message: err.to_string() }
	}
}
