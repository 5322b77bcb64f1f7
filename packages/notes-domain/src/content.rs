use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
	Text,
	Pdf,
}
impl ContentKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Text => "text",
			Self::Pdf => "pdf",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"text" => Some(Self::Text),
			"pdf" => Some(Self::Pdf),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
	Pending,
	Completed,
	Failed,
}
impl ExtractionStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Completed => "completed",
			Self::Failed => "failed",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"pending" => Some(Self::Pending),
			"completed" => Some(Self::Completed),
			"failed" => Some(Self::Failed),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
	User,
	Assistant,
}
impl MessageRole {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::User => "user",
			Self::Assistant => "assistant",
		}
	}
}

pub const CONVERSATION_TITLE_PREFIX: &str = "Chat about: ";

pub fn conversation_title(note_title: &str) -> String {
	format!("{CONVERSATION_TITLE_PREFIX}{note_title}")
}

/// Keeps the last `limit` entries of an ordered history.
pub fn tail<T>(history: &[T], limit: usize) -> &[T] {
	let start = history.len().saturating_sub(limit);

	&history[start..]
}
