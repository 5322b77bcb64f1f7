pub mod envelope;
pub mod http;
pub mod process;

mod error;

pub use error::{Error, Result};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Cap on captured stderr kept in errors.
pub const MAX_STDERR_CHARS: usize = 2_048;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
	Summary,
	Quiz,
	Chat,
	Extract,
}
impl Operation {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Summary => "summary",
			Self::Quiz => "quiz",
			Self::Chat => "chat",
			Self::Extract => "extract",
		}
	}
}

/// The single message sent to the collaborator for one unit of work.
#[derive(Clone, Debug, Serialize)]
pub struct CollaboratorRequest {
	pub operation: Operation,
	pub note_id: Uuid,
	pub payload: Value,
}

/// Sends `request` over the configured transport and returns the raw response text.
pub async fn invoke(
	cfg: &notes_config::Collaborator,
	request: &CollaboratorRequest,
) -> Result<String> {
	match cfg.transport.as_str() {
		notes_config::TRANSPORT_PROCESS => process::invoke(cfg, request).await,
		notes_config::TRANSPORT_HTTP => http::invoke(cfg, request).await,
		other => Err(Error::InvalidConfig {
			message: format!("Unsupported collaborator transport: {other}."),
		}),
	}
}

pub fn auth_headers(api_key: Option<&str>, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	if let Some(api_key) = api_key {
		headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
	let trimmed = text.trim();

	if trimmed.chars().count() <= max_chars {
		return trimmed.to_string();
	}

	let mut out: String = trimmed.chars().take(max_chars).collect();

	out.push_str("...");

	out
}
