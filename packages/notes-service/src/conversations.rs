//! Conversation Manager: chat threads about a single note.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, NotesService, Result};
use notes_domain::content::{self, MessageRole};
use notes_providers::{Operation, envelope};
use notes_storage::{
	models::{Conversation, ConversationSummary, Message},
	queries,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostMessageRequest {
	pub owner_id: Uuid,
	pub conversation_id: Uuid,
	pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct PostMessageResponse {
	pub user_message: MessageView,
	pub assistant_message: MessageView,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConversationView {
	pub conversation_id: Uuid,
	pub note_id: Uuid,
	pub title: String,
	pub is_active: bool,
	#[serde(with = "time::serde::rfc3339")]
	pub started_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub last_activity: OffsetDateTime,
}
impl From<Conversation> for ConversationView {
	fn from(row: Conversation) -> Self {
		Self {
			conversation_id: row.conversation_id,
			note_id: row.note_id,
			title: row.title,
			is_active: row.is_active,
			started_at: row.started_at,
			last_activity: row.last_activity,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct ConversationListItem {
	pub conversation_id: Uuid,
	pub note_id: Uuid,
	pub title: String,
	pub message_count: i64,
	#[serde(with = "time::serde::rfc3339")]
	pub started_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub last_activity: OffsetDateTime,
}
impl From<ConversationSummary> for ConversationListItem {
	fn from(row: ConversationSummary) -> Self {
		Self {
			conversation_id: row.conversation_id,
			note_id: row.note_id,
			title: row.title,
			message_count: row.message_count,
			started_at: row.started_at,
			last_activity: row.last_activity,
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct MessageView {
	pub message_id: Uuid,
	pub role: String,
	pub content: String,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}
impl From<Message> for MessageView {
	fn from(row: Message) -> Self {
		Self {
			message_id: row.message_id,
			role: row.role,
			content: row.content,
			created_at: row.created_at,
		}
	}
}

impl NotesService {
	/// Opens a new conversation about a note. Existing conversations are never reused here.
	pub async fn start_conversation(&self, note_id: Uuid, owner_id: Uuid) -> Result<ConversationView> {
		let note = self.owned_note(owner_id, note_id).await?;
		let now = OffsetDateTime::now_utc();
		let conversation = Conversation {
			conversation_id: Uuid::new_v4(),
			note_id,
			owner_id,
			title: content::conversation_title(&note.title),
			is_active: true,
			started_at: now,
			last_activity: now,
		};

		queries::insert_conversation(&self.db.pool, &conversation).await?;

		Ok(conversation.into())
	}

	/// Appends the user's message, asks the collaborator for a reply, and appends that too.
	///
	/// When the collaborator fails the user message stays in the history without an answer.
	pub async fn post_message(&self, req: PostMessageRequest) -> Result<PostMessageResponse> {
		let text = crate::required_text(&req.message, "message")?;
		let conversation = self.owned_conversation(req.owner_id, req.conversation_id).await?;
		let note = self.owned_note(req.owner_id, conversation.note_id).await?;
		let note_content = self.resolve_content(&note).await?;
		let history = queries::list_messages(&self.db.pool, conversation.conversation_id).await?;
		let user_message = queries::insert_message(
			&self.db.pool,
			conversation.conversation_id,
			MessageRole::User.as_str(),
			&text,
			OffsetDateTime::now_utc(),
		)
		.await?;

		queries::touch_conversation(
			&self.db.pool,
			conversation.conversation_id,
			user_message.created_at,
		)
		.await?;

		let recent = content::tail(&history, self.cfg.generation.chat_history_limit as usize);
		let payload = serde_json::json!({
			"note_title": note.title,
			"note_content": note_content,
			"file_type": note.content_kind,
			"conversation_history": recent
				.iter()
				.map(|message| serde_json::json!({ "role": message.role, "content": message.content }))
				.collect::<Vec<_>>(),
			"message": text,
		});
		let reply = self.call_collaborator(Operation::Chat, note.note_id, payload).await?;
		let reply_text = envelope::chat_reply(&reply)?;
		let assistant_message = queries::insert_message(
			&self.db.pool,
			conversation.conversation_id,
			MessageRole::Assistant.as_str(),
			&reply_text,
			OffsetDateTime::now_utc(),
		)
		.await?;

		queries::touch_conversation(
			&self.db.pool,
			conversation.conversation_id,
			assistant_message.created_at,
		)
		.await?;

		Ok(PostMessageResponse {
			user_message: user_message.into(),
			assistant_message: assistant_message.into(),
		})
	}

	/// Full history, oldest first.
	pub async fn get_messages(&self, owner_id: Uuid, conversation_id: Uuid) -> Result<Vec<MessageView>> {
		let conversation = self.owned_conversation(owner_id, conversation_id).await?;
		let messages = queries::list_messages(&self.db.pool, conversation.conversation_id).await?;

		Ok(messages.into_iter().map(MessageView::from).collect())
	}

	/// Active conversations for a note, most recently used first.
	pub async fn recent_conversations(
		&self,
		owner_id: Uuid,
		note_id: Uuid,
	) -> Result<Vec<ConversationListItem>> {
		self.owned_note(owner_id, note_id).await?;

		let limit = i64::from(self.cfg.generation.recent_conversations_limit);
		let rows = queries::list_recent_conversations(&self.db.pool, owner_id, note_id, limit).await?;

		Ok(rows.into_iter().map(ConversationListItem::from).collect())
	}

	pub async fn archive_conversation(&self, owner_id: Uuid, conversation_id: Uuid) -> Result<()> {
		let archived = queries::archive_conversation(&self.db.pool, owner_id, conversation_id).await?;

		if archived == 0 {
			return Err(Error::not_found("Conversation"));
		}

		Ok(())
	}

	async fn owned_conversation(&self, owner_id: Uuid, conversation_id: Uuid) -> Result<Conversation> {
		queries::fetch_conversation(&self.db.pool, owner_id, conversation_id)
			.await?
			.ok_or_else(|| Error::not_found("Conversation"))
	}
}
