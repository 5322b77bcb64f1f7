use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use notes_domain::job::GenerationKind;
use notes_service::{Error, Report, ScoreAttemptRequest};

use super::ScriptedCollaborator;

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTES_PG_DSN to run."]
async fn attempt_is_scored_and_detailed_per_question() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping attempt_is_scored_and_detailed_per_question; set NOTES_PG_DSN to run this test."
		);

		return;
	};
	let collaborator = Arc::new(ScriptedCollaborator::replying(super::QUIZ_REPLY));
	let service = super::build_service(&test_db, collaborator).await;
	let owner_id = Uuid::new_v4();
	let note = super::text_note(&service, owner_id).await;
	let quiz = service
		.request_generation(GenerationKind::Quiz, note.note_id, owner_id)
		.await
		.expect("Quiz request failed.");
	let attempt = service
		.score_attempt(ScoreAttemptRequest {
			owner_id,
			quiz_id: quiz.artifact_id(),
			answers: vec![Some(0), Some(1)],
			time_taken_seconds: Some(42),
		})
		.await
		.expect("Failed to score attempt.");

	assert_eq!(attempt.score, 1);
	assert_eq!(attempt.total_questions, 2);
	assert_eq!(attempt.percentage, 50);

	let Report::Detail { attempt: entry, questions } = service
		.get_report(owner_id, Some(attempt.attempt_id))
		.await
		.expect("Failed to load report.")
	else {
		panic!("Expected a detailed report.");
	};

	assert_eq!(entry.quiz_title, "Cells quiz");
	assert_eq!(entry.note_title, "Cells");
	assert!(questions[0].is_correct);
	assert!(!questions[1].is_correct);
	assert_eq!(questions[1].user_answer, "Wall");
	assert_eq!(questions[1].correct_answer, "Mitochondria");

	let invalid = service
		.score_attempt(ScoreAttemptRequest {
			owner_id,
			quiz_id: quiz.artifact_id(),
			answers: vec![Some(0)],
			time_taken_seconds: None,
		})
		.await;

	assert!(matches!(invalid, Err(Error::Validation { .. })));

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTES_PG_DSN to run."]
async fn skipped_answers_score_zero() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping skipped_answers_score_zero; set NOTES_PG_DSN to run this test.");

		return;
	};
	let collaborator = Arc::new(ScriptedCollaborator::replying(super::QUIZ_REPLY));
	let service = super::build_service(&test_db, collaborator).await;
	let owner_id = Uuid::new_v4();
	let note = super::text_note(&service, owner_id).await;
	let quiz = service
		.request_generation(GenerationKind::Quiz, note.note_id, owner_id)
		.await
		.expect("Quiz request failed.");
	let attempt = service
		.score_attempt(ScoreAttemptRequest {
			owner_id,
			quiz_id: quiz.artifact_id(),
			answers: vec![None, None],
			time_taken_seconds: None,
		})
		.await
		.expect("Failed to score attempt.");

	assert_eq!(attempt.score, 0);
	assert_eq!(attempt.answers, vec![None, None]);

	let Report::Detail { questions, .. } = service
		.get_report(owner_id, Some(attempt.attempt_id))
		.await
		.expect("Failed to load report.")
	else {
		panic!("Expected a detailed report.");
	};

	assert!(questions.iter().all(|row| row.user_answer == "Not answered" && !row.is_correct));

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTES_PG_DSN to run."]
async fn report_lists_attempts_newest_first() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping report_lists_attempts_newest_first; set NOTES_PG_DSN to run this test.");

		return;
	};
	let collaborator = Arc::new(ScriptedCollaborator::replying(super::QUIZ_REPLY));
	let service = super::build_service(&test_db, collaborator).await;
	let owner_id = Uuid::new_v4();
	let note = super::text_note(&service, owner_id).await;
	let mut attempt_ids = Vec::new();

	for answers in [vec![Some(0), Some(2)], vec![Some(0), None], vec![None, None]] {
		let quiz = service
			.request_generation(GenerationKind::Quiz, note.note_id, owner_id)
			.await
			.expect("Quiz request failed.");
		let attempt = service
			.score_attempt(ScoreAttemptRequest {
				owner_id,
				quiz_id: quiz.artifact_id(),
				answers,
				time_taken_seconds: None,
			})
			.await
			.expect("Failed to score attempt.");

		attempt_ids.push(attempt.attempt_id);

		tokio::time::sleep(Duration::from_millis(5)).await;
	}

	let Report::Listing { attempts } =
		service.get_report(owner_id, None).await.expect("Failed to load report.")
	else {
		panic!("Expected a report listing.");
	};
	let listed: Vec<Uuid> = attempts.iter().map(|entry| entry.attempt_id).collect();

	attempt_ids.reverse();

	assert_eq!(listed, attempt_ids);
	assert_eq!(attempts[0].percentage, 0);
	assert_eq!(attempts[1].percentage, 50);
	assert_eq!(attempts[2].percentage, 100);

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
