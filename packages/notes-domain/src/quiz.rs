use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const OPTION_COUNT: usize = 4;
pub const OPTION_LABELS: [&str; OPTION_COUNT] = ["A", "B", "C", "D"];
pub const NOT_ANSWERED: &str = "Not answered";

/// A stored quiz question. `correct_index` always points into `options`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
	pub question: String,
	pub options: Vec<String>,
	pub correct_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionError {
	#[error("Question {index} is not an object.")]
	NotAnObject { index: usize },
	#[error("Question {index} has empty text.")]
	EmptyText { index: usize },
	#[error("Question {index} must have exactly four options.")]
	OptionCount { index: usize },
	#[error("Question {index} has an empty option.")]
	EmptyOption { index: usize },
	#[error("Question {index} has an invalid correct answer.")]
	InvalidCorrect { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerError {
	#[error("Expected {expected} answers, got {actual}.")]
	LengthMismatch { expected: usize, actual: usize },
	#[error("Answer {position} selects option {value}, which does not exist.")]
	OptionOutOfRange { position: usize, value: u32 },
}

/// One graded row of an attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnswerReview {
	pub question_text: String,
	pub selected_index: Option<u32>,
	pub user_answer: String,
	pub correct_index: u32,
	pub correct_answer: String,
	pub is_correct: bool,
}

impl Question {
	/// Parses one question as produced by the collaborator.
	///
	/// `correct` may be an option letter (`"A"`..`"D"`, case-insensitive) or a zero-based
	/// index. Stored questions that already carry `correct_index` are accepted as well.
	pub fn from_generated(index: usize, raw: &Value) -> Result<Self, QuestionError> {
		let object = raw.as_object().ok_or(QuestionError::NotAnObject { index })?;
		let text = object
			.get("question")
			.and_then(Value::as_str)
			.map(str::trim)
			.filter(|text| !text.is_empty())
			.ok_or(QuestionError::EmptyText { index })?;
		let options = object
			.get("options")
			.and_then(Value::as_array)
			.filter(|options| options.len() == OPTION_COUNT)
			.ok_or(QuestionError::OptionCount { index })?;
		let mut parsed_options = Vec::with_capacity(OPTION_COUNT);

		for option in options {
			let option = option
				.as_str()
				.map(str::trim)
				.filter(|option| !option.is_empty())
				.ok_or(QuestionError::EmptyOption { index })?;

			parsed_options.push(option.to_string());
		}

		let correct = object
			.get("correct")
			.or_else(|| object.get("correct_index"))
			.and_then(parse_correct)
			.ok_or(QuestionError::InvalidCorrect { index })?;

		Ok(Self { question: text.to_string(), options: parsed_options, correct_index: correct })
	}

	pub fn option_text(&self, index: u32) -> Option<&str> {
		self.options.get(index as usize).map(String::as_str)
	}

	pub fn correct_text(&self) -> &str {
		self.option_text(self.correct_index).unwrap_or_default()
	}
}

pub fn parse_questions(raw: &[Value]) -> Result<Vec<Question>, QuestionError> {
	raw.iter().enumerate().map(|(index, value)| Question::from_generated(index, value)).collect()
}

/// Answers must line up one-to-one with the questions and only name existing options.
pub fn validate_answers(questions: &[Question], answers: &[Option<u32>]) -> Result<(), AnswerError> {
	if questions.len() != answers.len() {
		return Err(AnswerError::LengthMismatch {
			expected: questions.len(),
			actual: answers.len(),
		});
	}

	for (position, answer) in answers.iter().enumerate() {
		if let Some(value) = *answer
			&& value as usize >= OPTION_COUNT
		{
			return Err(AnswerError::OptionOutOfRange { position, value });
		}
	}

	Ok(())
}

/// Counts answers equal to the stored correct index. Skipped answers never count.
pub fn score_answers(questions: &[Question], answers: &[Option<u32>]) -> u32 {
	questions
		.iter()
		.zip(answers)
		.filter(|(question, answer)| **answer == Some(question.correct_index))
		.count() as u32
}

pub fn review_answers(questions: &[Question], answers: &[Option<u32>]) -> Vec<AnswerReview> {
	questions
		.iter()
		.enumerate()
		.map(|(position, question)| {
			let selected_index = answers.get(position).copied().flatten();
			let user_answer = selected_index
				.and_then(|index| question.option_text(index))
				.unwrap_or(NOT_ANSWERED)
				.to_string();

			AnswerReview {
				question_text: question.question.clone(),
				selected_index,
				user_answer,
				correct_index: question.correct_index,
				correct_answer: question.correct_text().to_string(),
				is_correct: selected_index == Some(question.correct_index),
			}
		})
		.collect()
}

fn parse_correct(value: &Value) -> Option<u32> {
	let index = match value {
		Value::String(label) => {
			let label = label.trim().to_ascii_uppercase();

			OPTION_LABELS.iter().position(|candidate| *candidate == label)? as u64
		},
		Value::Number(number) => number.as_u64()?,
		_ => return None,
	};

	if index as usize >= OPTION_COUNT {
		return None;
	}

	Some(index as u32)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn question(correct_index: u32) -> Question {
		Question {
			question: format!("Q{correct_index}"),
			options: vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()],
			correct_index,
		}
	}

	#[test]
	fn letter_and_index_forms_agree() {
		let letter = json!({ "question": "Q", "options": ["a", "b", "c", "d"], "correct": "c" });
		let index = json!({ "question": "Q", "options": ["a", "b", "c", "d"], "correct": 2 });

		assert_eq!(
			Question::from_generated(0, &letter).expect("letter form"),
			Question::from_generated(0, &index).expect("index form"),
		);
	}

	#[test]
	fn rejects_out_of_range_correct_index() {
		let raw = json!({ "question": "Q", "options": ["a", "b", "c", "d"], "correct": 4 });

		assert_eq!(
			Question::from_generated(3, &raw),
			Err(QuestionError::InvalidCorrect { index: 3 })
		);
	}

	#[test]
	fn all_skipped_scores_zero() {
		let questions = vec![question(0), question(1), question(2)];
		let answers = vec![None, None, None];

		assert_eq!(score_answers(&questions, &answers), 0);
		assert!(
			review_answers(&questions, &answers).iter().all(|row| row.user_answer == NOT_ANSWERED)
		);
	}
}
