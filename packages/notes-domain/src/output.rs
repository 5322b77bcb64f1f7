use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutputError {
	#[error("Output contains no JSON object.")]
	NoJsonObject,
	#[error("Output JSON object could not be parsed: {0}")]
	InvalidJson(String),
}

/// Returns the span from the first `{` to the last `}`, if the pair exists in that order.
pub fn json_object_span(text: &str) -> Option<&str> {
	let start = text.find('{')?;
	let end = text.rfind('}')?;

	if end < start {
		return None;
	}

	Some(&text[start..=end])
}

/// Locates and parses the single JSON object in a collaborator's output.
///
/// Text before the first `{` and after the last `}` is ignored so stray log lines do not
/// break decoding.
pub fn parse_json_object(text: &str) -> Result<Map<String, Value>, OutputError> {
	let span = json_object_span(text).ok_or(OutputError::NoJsonObject)?;

	match serde_json::from_str::<Value>(span) {
		Ok(Value::Object(object)) => Ok(object),
		Ok(_) => Err(OutputError::NoJsonObject),
		Err(err) => Err(OutputError::InvalidJson(err.to_string())),
	}
}
