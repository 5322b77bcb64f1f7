use axum::{
	Json, Router,
	extract::{FromRequest, FromRequestParts, Path, Request, State, rejection::JsonRejection},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;
use notes_domain::job::GenerationKind;
use notes_service::{
	Artifact, AttemptView, BackfillReport, ConversationListItem, ConversationView,
	CreateTextNoteRequest, Error as ServiceError, JobView, MessageView, NoteListItem, NoteView,
	PostMessageRequest, PostMessageResponse, QuizView, RegisterPdfNoteRequest, Report,
	ScoreAttemptRequest, SummaryView, UpdateNoteTitleRequest,
};

pub const HEADER_OWNER_ID: &str = "X-Owner-Id";

pub fn router(state: AppState) -> Router {
	let v1 = Router::new()
		.route("/v1/notes", post(create_note).get(list_notes))
		.route("/v1/notes/pdf", post(register_pdf_note))
		.route("/v1/notes/{note_id}", get(get_note).patch(update_note).delete(delete_note))
		.route("/v1/notes/{note_id}/summary", post(generate_summary).get(get_summary))
		.route("/v1/notes/{note_id}/jobs", post(enqueue_job))
		.route("/v1/jobs/{job_id}", get(get_job))
		.route("/v1/notes/{note_id}/quizzes", post(generate_quiz).get(list_quizzes))
		.route("/v1/notes/{note_id}/quizzes/latest", get(latest_quiz))
		.route("/v1/quizzes/{quiz_id}/attempts", post(score_attempt))
		.route("/v1/reports/quizzes", get(list_reports))
		.route("/v1/reports/quizzes/{attempt_id}", get(report_detail))
		.route(
			"/v1/notes/{note_id}/conversations",
			post(start_conversation).get(recent_conversations),
		)
		.route(
			"/v1/conversations/{conversation_id}/messages",
			get(get_messages).post(post_message),
		)
		.route("/v1/conversations/{conversation_id}/archive", post(archive_conversation))
		.route_layer(middleware::from_fn_with_state(state.clone(), require_api_token));

	Router::new().route("/health", get(health)).merge(v1).with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/extractions/backfill", post(backfill_extractions))
		.route_layer(middleware::from_fn_with_state(state.clone(), require_admin_token))
		.with_state(state)
}

/// The caller's identity, taken from the `X-Owner-Id` header.
#[derive(Clone, Copy, Debug)]
pub struct Owner(pub Uuid);
impl<S> FromRequestParts<S> for Owner
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let raw = parts
			.headers
			.get(HEADER_OWNER_ID)
			.and_then(|value| value.to_str().ok())
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.ok_or_else(|| {
				json_error(
					StatusCode::BAD_REQUEST,
					"INVALID_OWNER",
					format!("{HEADER_OWNER_ID} header is required."),
					Some(vec![HEADER_OWNER_ID.to_string()]),
				)
			})?;
		let owner_id = Uuid::parse_str(raw).map_err(|_| {
			json_error(
				StatusCode::BAD_REQUEST,
				"INVALID_OWNER",
				format!("{HEADER_OWNER_ID} must be a UUID."),
				Some(vec![HEADER_OWNER_ID.to_string()]),
			)
		})?;

		Ok(Self(owner_id))
	}
}

/// A JSON body whose rejections come back in the structured error shape.
pub struct JsonBody<T>(pub T);
impl<T, S> FromRequest<S> for JsonBody<T>
where
	Json<T>: FromRequest<S, Rejection = JsonRejection>,
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let Json(value) = Json::<T>::from_request(req, state).await?;

		Ok(Self(value))
	}
}

#[derive(Debug, Deserialize)]
struct CreateNoteBody {
	title: String,
	content: String,
}

#[derive(Debug, Deserialize)]
struct RegisterPdfBody {
	title: String,
	file_ref: String,
	file_size: i64,
}

#[derive(Debug, Deserialize)]
struct UpdateNoteBody {
	title: String,
}

#[derive(Debug, Deserialize)]
struct EnqueueJobBody {
	kind: GenerationKind,
}

#[derive(Debug, Deserialize)]
struct ScoreAttemptBody {
	answers: Vec<Option<u32>>,
	#[serde(default)]
	time_taken_seconds: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct PostMessageBody {
	message: String,
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn create_note(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	JsonBody(body): JsonBody<CreateNoteBody>,
) -> Result<(StatusCode, Json<NoteView>), ApiError> {
	let response = state
		.service
		.create_text_note(CreateTextNoteRequest { owner_id, title: body.title, content: body.content })
		.await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn register_pdf_note(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	JsonBody(body): JsonBody<RegisterPdfBody>,
) -> Result<(StatusCode, Json<NoteView>), ApiError> {
	let response = state
		.service
		.register_pdf_note(RegisterPdfNoteRequest {
			owner_id,
			title: body.title,
			file_ref: body.file_ref,
			file_size: body.file_size,
		})
		.await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn list_notes(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
) -> Result<Json<Vec<NoteListItem>>, ApiError> {
	Ok(Json(state.service.list_notes(owner_id).await?))
}

async fn get_note(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(note_id): Path<Uuid>,
) -> Result<Json<NoteView>, ApiError> {
	Ok(Json(state.service.get_note(owner_id, note_id).await?))
}

async fn update_note(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(note_id): Path<Uuid>,
	JsonBody(body): JsonBody<UpdateNoteBody>,
) -> Result<Json<NoteView>, ApiError> {
	let response = state
		.service
		.update_note_title(UpdateNoteTitleRequest { owner_id, note_id, title: body.title })
		.await?;

	Ok(Json(response))
}

async fn delete_note(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(note_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
	state.service.delete_note(owner_id, note_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn generate_summary(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(note_id): Path<Uuid>,
) -> Result<Json<Artifact>, ApiError> {
	let artifact =
		state.service.request_generation(GenerationKind::Summary, note_id, owner_id).await?;

	Ok(Json(artifact))
}

async fn get_summary(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(note_id): Path<Uuid>,
) -> Result<Json<SummaryView>, ApiError> {
	Ok(Json(state.service.get_summary(owner_id, note_id).await?))
}

async fn enqueue_job(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(note_id): Path<Uuid>,
	JsonBody(body): JsonBody<EnqueueJobBody>,
) -> Result<(StatusCode, Json<JobView>), ApiError> {
	let job = state.service.enqueue_generation(body.kind, note_id, owner_id).await?;

	Ok((StatusCode::ACCEPTED, Json(job)))
}

async fn get_job(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(job_id): Path<Uuid>,
) -> Result<Json<JobView>, ApiError> {
	Ok(Json(state.service.get_job(owner_id, job_id).await?))
}

async fn generate_quiz(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(note_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Artifact>), ApiError> {
	let artifact =
		state.service.request_generation(GenerationKind::Quiz, note_id, owner_id).await?;

	Ok((StatusCode::CREATED, Json(artifact)))
}

async fn list_quizzes(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(note_id): Path<Uuid>,
) -> Result<Json<Vec<QuizView>>, ApiError> {
	Ok(Json(state.service.list_quizzes(owner_id, note_id).await?))
}

async fn latest_quiz(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(note_id): Path<Uuid>,
) -> Result<Json<QuizView>, ApiError> {
	Ok(Json(state.service.latest_quiz(owner_id, note_id).await?))
}

async fn score_attempt(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(quiz_id): Path<Uuid>,
	JsonBody(body): JsonBody<ScoreAttemptBody>,
) -> Result<(StatusCode, Json<AttemptView>), ApiError> {
	let attempt = state
		.service
		.score_attempt(ScoreAttemptRequest {
			owner_id,
			quiz_id,
			answers: body.answers,
			time_taken_seconds: body.time_taken_seconds,
		})
		.await?;

	Ok((StatusCode::CREATED, Json(attempt)))
}

async fn list_reports(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
) -> Result<Json<Report>, ApiError> {
	Ok(Json(state.service.get_report(owner_id, None).await?))
}

async fn report_detail(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(attempt_id): Path<Uuid>,
) -> Result<Json<Report>, ApiError> {
	Ok(Json(state.service.get_report(owner_id, Some(attempt_id)).await?))
}

async fn start_conversation(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(note_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ConversationView>), ApiError> {
	let conversation = state.service.start_conversation(note_id, owner_id).await?;

	Ok((StatusCode::CREATED, Json(conversation)))
}

async fn recent_conversations(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(note_id): Path<Uuid>,
) -> Result<Json<Vec<ConversationListItem>>, ApiError> {
	Ok(Json(state.service.recent_conversations(owner_id, note_id).await?))
}

async fn get_messages(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(conversation_id): Path<Uuid>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
	Ok(Json(state.service.get_messages(owner_id, conversation_id).await?))
}

async fn post_message(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(conversation_id): Path<Uuid>,
	JsonBody(body): JsonBody<PostMessageBody>,
) -> Result<Json<PostMessageResponse>, ApiError> {
	let response = state
		.service
		.post_message(PostMessageRequest { owner_id, conversation_id, message: body.message })
		.await?;

	Ok(Json(response))
}

async fn archive_conversation(
	State(state): State<AppState>,
	Owner(owner_id): Owner,
	Path(conversation_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
	state.service.archive_conversation(owner_id, conversation_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn backfill_extractions(
	State(state): State<AppState>,
) -> Result<Json<BackfillReport>, ApiError> {
	Ok(Json(state.service.backfill_extractions().await?))
}

async fn require_api_token(
	State(state): State<AppState>,
	req: Request,
	next: Next,
) -> Result<Response, ApiError> {
	check_bearer(req.headers(), state.service.cfg.security.api_auth_token.as_deref())?;

	Ok(next.run(req).await)
}

async fn require_admin_token(
	State(state): State<AppState>,
	req: Request,
	next: Next,
) -> Result<Response, ApiError> {
	check_bearer(req.headers(), state.service.cfg.security.admin_auth_token.as_deref())?;

	Ok(next.run(req).await)
}

fn check_bearer(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ApiError> {
	let Some(expected) = expected else {
		return Ok(());
	};

	if read_bearer_token(headers).is_some_and(|token| token == expected) {
		return Ok(());
	}

	Err(json_error(
		StatusCode::UNAUTHORIZED,
		"UNAUTHORIZED",
		"A valid Bearer token is required.",
		None,
	))
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let message = err.public_message();
		let (status, code) = match &err {
			ServiceError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
			ServiceError::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_REQUEST"),
			ServiceError::ExtractionPending { .. } => (StatusCode::CONFLICT, "EXTRACTION_PENDING"),
			ServiceError::ExtractionFailed { note_id, message: detail } => {
				tracing::warn!(note_id = %note_id, error = %detail, "Generation blocked by failed extraction.");

				(StatusCode::UNPROCESSABLE_ENTITY, "EXTRACTION_FAILED")
			},
			ServiceError::Conflict { .. } => (StatusCode::CONFLICT, "CONFLICT"),
			ServiceError::CollaboratorUnavailable { .. } => {
				tracing::error!(error = %err, "Generation collaborator is unavailable.");

				(StatusCode::SERVICE_UNAVAILABLE, "COLLABORATOR_UNAVAILABLE")
			},
			ServiceError::CollaboratorTimedOut { .. } => {
				tracing::error!(error = %err, "Generation collaborator timed out.");

				(StatusCode::GATEWAY_TIMEOUT, "COLLABORATOR_TIMEOUT")
			},
			ServiceError::CollaboratorNonZeroExit { .. }
			| ServiceError::CollaboratorReportedFailure { .. } => {
				tracing::warn!(error = %err, "Generation collaborator failed.");

				(StatusCode::BAD_GATEWAY, "COLLABORATOR_FAILED")
			},
			ServiceError::MalformedOutput { .. } => {
				tracing::warn!(error = %err, "Generation collaborator returned malformed output.");

				(StatusCode::BAD_GATEWAY, "MALFORMED_OUTPUT")
			},
			ServiceError::Storage { .. } => {
				tracing::error!(error = %err, "Storage failure.");

				(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
			},
		};

		json_error(status, code, message, None)
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		json_error(
			StatusCode::UNPROCESSABLE_ENTITY,
			"INVALID_REQUEST",
			format!("Request body is invalid: {}", rejection.body_text()),
			None,
		)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
