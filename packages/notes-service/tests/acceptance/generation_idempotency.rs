use std::sync::Arc;

use uuid::Uuid;

use notes_domain::job::GenerationKind;
use notes_service::{Artifact, Error};
use notes_storage::queries;

use super::ScriptedCollaborator;

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTES_PG_DSN to run."]
async fn summary_is_generated_once_and_reused() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping summary_is_generated_once_and_reused; set NOTES_PG_DSN to run this test.");

		return;
	};
	let collaborator = Arc::new(ScriptedCollaborator::replying(
		"loading...\n{\"success\": true, \"summary\": {\"content\": \"Cells are units of life.\", \
		 \"ai_model\": \"gemini-2.5-flash\"}}",
	));
	let service = super::build_service(&test_db, collaborator.clone()).await;
	let owner_id = Uuid::new_v4();
	let note = super::text_note(&service, owner_id).await;
	let first = service
		.request_generation(GenerationKind::Summary, note.note_id, owner_id)
		.await
		.expect("First summary request failed.");
	let second = service
		.request_generation(GenerationKind::Summary, note.note_id, owner_id)
		.await
		.expect("Second summary request failed.");
	let (Artifact::Summary(first), Artifact::Summary(second)) = (first, second) else {
		panic!("Expected summary artifacts.");
	};

	assert_eq!(collaborator.count(), 1);
	assert_eq!(first.summary_id, second.summary_id);
	assert_eq!(second.content, "Cells are units of life.");
	assert_eq!(second.ai_model, "gemini-2.5-flash");

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTES_PG_DSN to run."]
async fn malformed_output_stores_nothing() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping malformed_output_stores_nothing; set NOTES_PG_DSN to run this test.");

		return;
	};
	let collaborator =
		Arc::new(ScriptedCollaborator::replying("Traceback: model quota exceeded, no JSON here"));
	let service = super::build_service(&test_db, collaborator.clone()).await;
	let owner_id = Uuid::new_v4();
	let note = super::text_note(&service, owner_id).await;
	let summary = service.request_generation(GenerationKind::Summary, note.note_id, owner_id).await;
	let quiz = service.request_generation(GenerationKind::Quiz, note.note_id, owner_id).await;

	assert!(matches!(summary, Err(Error::MalformedOutput { .. })));
	assert!(matches!(quiz, Err(Error::MalformedOutput { .. })));
	assert!(
		queries::fetch_summary(&service.db.pool, owner_id, note.note_id)
			.await
			.expect("Failed to fetch summary.")
			.is_none()
	);
	assert!(
		queries::list_quizzes(&service.db.pool, owner_id, note.note_id)
			.await
			.expect("Failed to list quizzes.")
			.is_empty()
	);

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTES_PG_DSN to run."]
async fn quiz_requests_always_create_a_new_quiz() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping quiz_requests_always_create_a_new_quiz; set NOTES_PG_DSN to run this test."
		);

		return;
	};
	let collaborator = Arc::new(ScriptedCollaborator::replying(super::QUIZ_REPLY));
	let service = super::build_service(&test_db, collaborator.clone()).await;
	let owner_id = Uuid::new_v4();
	let note = super::text_note(&service, owner_id).await;

	service
		.request_generation(GenerationKind::Quiz, note.note_id, owner_id)
		.await
		.expect("First quiz request failed.");

	let second = service
		.request_generation(GenerationKind::Quiz, note.note_id, owner_id)
		.await
		.expect("Second quiz request failed.");
	let latest = service.latest_quiz(owner_id, note.note_id).await.expect("Missing latest quiz.");
	let all = service.list_quizzes(owner_id, note.note_id).await.expect("Failed to list quizzes.");

	assert_eq!(collaborator.count(), 2);
	assert_eq!(all.len(), 2);
	assert_eq!(latest.quiz_id, second.artifact_id());
	assert_eq!(latest.title, "Cells quiz");
	assert_eq!(latest.questions[1].correct_index, 2);

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
