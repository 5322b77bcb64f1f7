use std::sync::Arc;

use uuid::Uuid;

use notes_domain::job::GenerationKind;
use notes_service::{Error, PostMessageRequest, ScoreAttemptRequest};

use super::ScriptedCollaborator;

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTES_PG_DSN to run."]
async fn foreign_owner_sees_not_found_everywhere() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping foreign_owner_sees_not_found_everywhere; set NOTES_PG_DSN to run this test."
		);

		return;
	};
	let collaborator = Arc::new(ScriptedCollaborator::replying(super::QUIZ_REPLY));
	let service = super::build_service(&test_db, collaborator.clone()).await;
	let owner_a = Uuid::new_v4();
	let owner_b = Uuid::new_v4();
	let note = super::text_note(&service, owner_a).await;
	let quiz = service
		.request_generation(GenerationKind::Quiz, note.note_id, owner_a)
		.await
		.expect("Quiz request failed.");
	let attempt = service
		.score_attempt(ScoreAttemptRequest {
			owner_id: owner_a,
			quiz_id: quiz.artifact_id(),
			answers: vec![Some(0), None],
			time_taken_seconds: Some(30),
		})
		.await
		.expect("Failed to score attempt.");
	let conversation =
		service.start_conversation(note.note_id, owner_a).await.expect("Failed to start chat.");
	let calls_before = collaborator.count();

	assert!(matches!(
		service.request_generation(GenerationKind::Summary, note.note_id, owner_b).await,
		Err(Error::NotFound { .. })
	));
	assert!(matches!(
		service
			.post_message(PostMessageRequest {
				owner_id: owner_b,
				conversation_id: conversation.conversation_id,
				message: "hello".to_string(),
			})
			.await,
		Err(Error::NotFound { .. })
	));
	assert!(matches!(
		service.get_report(owner_b, Some(attempt.attempt_id)).await,
		Err(Error::NotFound { .. })
	));
	assert!(matches!(
		service
			.score_attempt(ScoreAttemptRequest {
				owner_id: owner_b,
				quiz_id: quiz.artifact_id(),
				answers: vec![None, None],
				time_taken_seconds: None,
			})
			.await,
		Err(Error::NotFound { .. })
	));
	assert!(matches!(service.get_note(owner_b, note.note_id).await, Err(Error::NotFound { .. })));
	assert!(matches!(
		service.start_conversation(note.note_id, owner_b).await,
		Err(Error::NotFound { .. })
	));
	assert!(matches!(
		service.delete_note(owner_b, note.note_id).await,
		Err(Error::NotFound { .. })
	));
	assert!(service.list_notes(owner_b).await.expect("Failed to list notes.").is_empty());
	assert_eq!(collaborator.count(), calls_before);

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
