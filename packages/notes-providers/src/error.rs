pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Collaborator is unavailable: {message}")]
	Unavailable { message: String },
	#[error("Collaborator did not finish within {timeout_ms} ms.")]
	TimedOut { timeout_ms: u64 },
	#[error("Collaborator exited with code {code}: {stderr}")]
	NonZeroExit { code: i32, stderr: String },
	#[error("Collaborator output is malformed: {message}")]
	MalformedOutput { message: String },
	#[error("Collaborator reported failure: {message}")]
	ReportedFailure { message: String },
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
}
