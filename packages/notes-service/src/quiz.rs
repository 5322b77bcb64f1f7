//! Quiz Evaluator & Reporter.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, NotesService, Result};
use notes_domain::{
	quiz::{self, AnswerReview},
	report,
};
use notes_storage::{
	models::{AttemptReportRow, QuizAttempt},
	queries,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreAttemptRequest {
	pub owner_id: Uuid,
	pub quiz_id: Uuid,
	/// One entry per question; `None` marks a skipped question.
	pub answers: Vec<Option<u32>>,
	pub time_taken_seconds: Option<i32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AttemptView {
	pub attempt_id: Uuid,
	pub quiz_id: Uuid,
	pub answers: Vec<Option<u32>>,
	pub score: u32,
	pub total_questions: u32,
	pub percentage: u32,
	pub time_taken_seconds: Option<i32>,
	#[serde(with = "time::serde::rfc3339")]
	pub completed_at: OffsetDateTime,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReportEntry {
	pub attempt_id: Uuid,
	pub quiz_id: Uuid,
	pub note_id: Option<Uuid>,
	pub quiz_title: String,
	pub note_title: String,
	pub score: u32,
	pub total_questions: u32,
	pub percentage: u32,
	pub time_taken_seconds: Option<i32>,
	#[serde(with = "time::serde::rfc3339")]
	pub completed_at: OffsetDateTime,
}
impl From<AttemptReportRow> for ReportEntry {
	fn from(row: AttemptReportRow) -> Self {
		let score = row.score.max(0) as u32;
		let total_questions = row.total_questions.max(0) as u32;

		Self {
			attempt_id: row.attempt_id,
			quiz_id: row.quiz_id,
			note_id: row.note_id,
			quiz_title: report::display_title(row.quiz_title.as_deref(), report::DEFAULT_QUIZ_TITLE)
				.to_string(),
			note_title: report::display_title(row.note_title.as_deref(), report::DEFAULT_NOTE_TITLE)
				.to_string(),
			score,
			total_questions,
			percentage: report::percentage(score, total_questions),
			time_taken_seconds: row.time_taken_seconds,
			completed_at: row.completed_at,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Report {
	/// Every attempt of the owner, newest first.
	Listing { attempts: Vec<ReportEntry> },
	/// One attempt graded question by question.
	Detail { attempt: ReportEntry, questions: Vec<AnswerReview> },
}

impl NotesService {
	/// Grades and stores an attempt. Answers are stored exactly as submitted.
	pub async fn score_attempt(&self, req: ScoreAttemptRequest) -> Result<AttemptView> {
		if req.time_taken_seconds.is_some_and(|seconds| seconds < 0) {
			return Err(Error::validation("time_taken_seconds must be zero or greater."));
		}

		let stored = queries::fetch_quiz(&self.db.pool, req.owner_id, req.quiz_id)
			.await?
			.ok_or_else(|| Error::not_found("Quiz"))?;
		let questions = crate::dispatch::stored_questions(&stored.questions)?;

		quiz::validate_answers(&questions, &req.answers)
			.map_err(|err| Error::validation(err.to_string()))?;

		let score = quiz::score_answers(&questions, &req.answers);
		let total_questions = questions.len() as u32;
		let attempt = QuizAttempt {
			attempt_id: Uuid::new_v4(),
			quiz_id: stored.quiz_id,
			owner_id: req.owner_id,
			answers: serde_json::to_value(&req.answers)?,
			score: score as i32,
			total_questions: total_questions as i32,
			time_taken_seconds: req.time_taken_seconds,
			completed_at: OffsetDateTime::now_utc(),
		};

		queries::insert_attempt(&self.db.pool, &attempt).await?;

		tracing::info!(
			attempt_id = %attempt.attempt_id,
			quiz_id = %attempt.quiz_id,
			score,
			total_questions,
			"Stored quiz attempt."
		);

		Ok(AttemptView {
			attempt_id: attempt.attempt_id,
			quiz_id: attempt.quiz_id,
			answers: req.answers,
			score,
			total_questions,
			percentage: report::percentage(score, total_questions),
			time_taken_seconds: attempt.time_taken_seconds,
			completed_at: attempt.completed_at,
		})
	}

	/// Lists every attempt of the owner, or grades one attempt in detail.
	pub async fn get_report(&self, owner_id: Uuid, attempt_id: Option<Uuid>) -> Result<Report> {
		let Some(attempt_id) = attempt_id else {
			let rows = queries::list_attempt_reports(&self.db.pool, owner_id).await?;

			return Ok(Report::Listing { attempts: rows.into_iter().map(ReportEntry::from).collect() });
		};
		let row = queries::fetch_attempt_report(&self.db.pool, owner_id, attempt_id)
			.await?
			.ok_or_else(|| Error::not_found("Attempt"))?;
		let attempt = queries::fetch_attempt(&self.db.pool, owner_id, attempt_id)
			.await?
			.ok_or_else(|| Error::not_found("Attempt"))?;
		let answers = stored_answers(&attempt.answers)?;
		let questions = match queries::fetch_quiz(&self.db.pool, owner_id, attempt.quiz_id).await? {
			Some(stored) => crate::dispatch::stored_questions(&stored.questions)?,
			None => Vec::new(),
		};

		Ok(Report::Detail {
			attempt: row.into(),
			questions: quiz::review_answers(&questions, &answers),
		})
	}
}

fn stored_answers(raw: &Value) -> Result<Vec<Option<u32>>> {
	serde_json::from_value(raw.clone())
		.map_err(|err| Error::Storage { message: format!("Stored answers are unreadable: {err}.") })
}
