use std::sync::Arc;

use uuid::Uuid;

use notes_service::{Error, PostMessageRequest};

use super::ScriptedCollaborator;

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTES_PG_DSN to run."]
async fn successful_turn_appends_user_and_assistant_messages() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping successful_turn_appends_user_and_assistant_messages; set NOTES_PG_DSN to run this test."
		);

		return;
	};
	let collaborator = Arc::new(ScriptedCollaborator::replying(
		"{\"success\": true, \"message\": \"Cells are the smallest living units.\", \"model\": \"m\"}",
	));
	let service = super::build_service(&test_db, collaborator.clone()).await;
	let owner_id = Uuid::new_v4();
	let note = super::text_note(&service, owner_id).await;
	let conversation =
		service.start_conversation(note.note_id, owner_id).await.expect("Failed to start chat.");

	assert_eq!(conversation.title, "Chat about: Cells");

	let turn = service
		.post_message(PostMessageRequest {
			owner_id,
			conversation_id: conversation.conversation_id,
			message: "hello".to_string(),
		})
		.await
		.expect("Chat turn failed.");
	let messages = service
		.get_messages(owner_id, conversation.conversation_id)
		.await
		.expect("Failed to list messages.");

	assert_eq!(turn.user_message.content, "hello");
	assert_eq!(turn.assistant_message.content, "Cells are the smallest living units.");
	assert_eq!(messages.len(), 2);
	assert_eq!(messages[0].role, "user");
	assert_eq!(messages[1].role, "assistant");
	assert_eq!(collaborator.count(), 1);

	let recent =
		service.recent_conversations(owner_id, note.note_id).await.expect("Failed to list chats.");

	assert_eq!(recent.len(), 1);
	assert_eq!(recent[0].message_count, 2);

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTES_PG_DSN to run."]
async fn failed_turn_keeps_only_the_user_message() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping failed_turn_keeps_only_the_user_message; set NOTES_PG_DSN to run this test."
		);

		return;
	};
	let collaborator = Arc::new(ScriptedCollaborator::failing());
	let service = super::build_service(&test_db, collaborator.clone()).await;
	let owner_id = Uuid::new_v4();
	let note = super::text_note(&service, owner_id).await;
	let conversation =
		service.start_conversation(note.note_id, owner_id).await.expect("Failed to start chat.");
	let result = service
		.post_message(PostMessageRequest {
			owner_id,
			conversation_id: conversation.conversation_id,
			message: "hello".to_string(),
		})
		.await;
	let messages = service
		.get_messages(owner_id, conversation.conversation_id)
		.await
		.expect("Failed to list messages.");

	assert!(matches!(result, Err(Error::CollaboratorNonZeroExit { code: 1, .. })));
	assert_eq!(messages.len(), 1);
	assert_eq!(messages[0].role, "user");
	assert_eq!(messages[0].content, "hello");

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTES_PG_DSN to run."]
async fn archived_conversations_are_not_offered_for_resumption() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping archived_conversations_are_not_offered_for_resumption; set NOTES_PG_DSN to run this test."
		);

		return;
	};
	let collaborator = Arc::new(ScriptedCollaborator::failing());
	let service = super::build_service(&test_db, collaborator).await;
	let owner_id = Uuid::new_v4();
	let note = super::text_note(&service, owner_id).await;
	let kept =
		service.start_conversation(note.note_id, owner_id).await.expect("Failed to start chat.");
	let archived =
		service.start_conversation(note.note_id, owner_id).await.expect("Failed to start chat.");

	service
		.archive_conversation(owner_id, archived.conversation_id)
		.await
		.expect("Failed to archive chat.");

	let recent =
		service.recent_conversations(owner_id, note.note_id).await.expect("Failed to list chats.");

	assert_eq!(recent.len(), 1);
	assert_eq!(recent[0].conversation_id, kept.conversation_id);

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
