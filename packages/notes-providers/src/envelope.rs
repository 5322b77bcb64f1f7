//! Decoding of the collaborator's reply envelope.
//!
//! Every reply is one JSON object carrying a `success` flag. Successful replies carry an
//! operation-specific field: `summary`, `quiz`, `message` (chat), or `extracted_text`.

use serde_json::{Map, Value};

use notes_domain::{
	output::{self, OutputError},
	quiz::{self, Question},
};

use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedSummary {
	pub content: String,
	pub ai_model: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedQuiz {
	pub title: Option<String>,
	pub questions: Vec<Question>,
}

/// Finds the reply object in `text` and checks its `success` flag.
pub fn decode(text: &str) -> Result<Map<String, Value>> {
	let object = output::parse_json_object(text).map_err(|err| match err {
		OutputError::NoJsonObject => malformed("no JSON object in output"),
		OutputError::InvalidJson(message) => Error::MalformedOutput { message },
	})?;
	let success = object
		.get("success")
		.and_then(Value::as_bool)
		.ok_or_else(|| malformed("missing boolean success field"))?;

	if !success {
		let message = object
			.get("error")
			.and_then(Value::as_str)
			.or_else(|| object.get("message").and_then(Value::as_str))
			.unwrap_or("Collaborator did not provide a reason.")
			.to_string();

		return Err(Error::ReportedFailure { message });
	}

	Ok(object)
}

pub fn summary(object: &Map<String, Value>) -> Result<GeneratedSummary> {
	match object.get("summary") {
		Some(Value::String(content)) => Ok(GeneratedSummary {
			content: non_empty(content, "summary")?,
			ai_model: None,
		}),
		Some(Value::Object(summary)) => {
			let content = summary
				.get("content")
				.and_then(Value::as_str)
				.ok_or_else(|| malformed("summary.content is missing"))?;
			let ai_model = summary
				.get("ai_model")
				.and_then(Value::as_str)
				.map(str::trim)
				.filter(|model| !model.is_empty())
				.map(str::to_string);

			Ok(GeneratedSummary { content: non_empty(content, "summary.content")?, ai_model })
		},
		_ => Err(malformed("summary is missing")),
	}
}

pub fn quiz(object: &Map<String, Value>) -> Result<GeneratedQuiz> {
	let (title, raw_questions) = match object.get("quiz") {
		Some(Value::Array(questions)) => (None, questions),
		Some(Value::Object(quiz)) => {
			let questions = quiz
				.get("questions")
				.and_then(Value::as_array)
				.ok_or_else(|| malformed("quiz.questions is missing"))?;
			let title = quiz
				.get("title")
				.and_then(Value::as_str)
				.map(str::trim)
				.filter(|title| !title.is_empty())
				.map(str::to_string);

			(title, questions)
		},
		_ => return Err(malformed("quiz is missing")),
	};

	if raw_questions.is_empty() {
		return Err(malformed("quiz has no questions"));
	}

	let questions = quiz::parse_questions(raw_questions)
		.map_err(|err| Error::MalformedOutput { message: err.to_string() })?;

	Ok(GeneratedQuiz { title, questions })
}

pub fn chat_reply(object: &Map<String, Value>) -> Result<String> {
	let reply =
		object.get("message").and_then(Value::as_str).ok_or_else(|| malformed("message is missing"))?;

	non_empty(reply, "message")
}

pub fn extracted_text(object: &Map<String, Value>) -> Result<String> {
	object
		.get("extracted_text")
		.and_then(Value::as_str)
		.map(str::to_string)
		.ok_or_else(|| malformed("extracted_text is missing"))
}

fn non_empty(text: &str, field: &str) -> Result<String> {
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return Err(malformed(&format!("{field} is empty")));
	}

	Ok(trimmed.to_string())
}

fn malformed(message: &str) -> Error {
	Error::MalformedOutput { message: format!("{message}.") }
}
