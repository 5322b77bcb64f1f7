use std::sync::Arc;

use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use notes_config::Collaborator;
use notes_domain::job::GenerationKind;
use notes_providers::CollaboratorRequest;
use notes_service::{
	BoxFuture, Error, GENERIC_FAILURE_MESSAGE, GenerationCollaborator, NotesService,
	RegisterPdfNoteRequest,
};
use notes_storage::{db::Db, jobs};

use super::ScriptedCollaborator;

const EXTRACT_AND_SUMMARY_REPLY: &str = "{\"success\": true, \"extracted_text\": \"Photosynthesis converts light.\", \
	 \"summary\": \"Plants turn light into sugar.\"}";

/// Fails every running job behind the worker's back, then replies with a summary.
struct ExpiringCollaborator {
	pool: PgPool,
}
impl GenerationCollaborator for ExpiringCollaborator {
	fn invoke<'a>(
		&'a self,
		_cfg: &'a Collaborator,
		_request: &'a CollaboratorRequest,
	) -> BoxFuture<'a, notes_providers::Result<String>> {
		Box::pin(async move {
			sqlx::query(
				"UPDATE generation_jobs SET status = 'failed', error_code = 'lease_expired', \
				 lease_until = NULL WHERE status = 'running'",
			)
			.execute(&self.pool)
			.await
			.expect("Failed to expire running jobs.");

			Ok("{\"success\": true, \"summary\": \"Cells divide.\"}".to_string())
		})
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTES_PG_DSN to run."]
async fn summary_job_runs_to_completion_and_is_deduplicated() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping summary_job_runs_to_completion_and_is_deduplicated; set NOTES_PG_DSN to run this test."
		);

		return;
	};
	let collaborator = Arc::new(ScriptedCollaborator::replying(
		"{\"success\": true, \"summary\": \"Cells are units of life.\"}",
	));
	let service = super::build_service(&test_db, collaborator.clone()).await;
	let owner_id = Uuid::new_v4();
	let note = super::text_note(&service, owner_id).await;
	let queued = service
		.enqueue_generation(GenerationKind::Summary, note.note_id, owner_id)
		.await
		.expect("Failed to enqueue summary.");
	let again = service
		.enqueue_generation(GenerationKind::Summary, note.note_id, owner_id)
		.await
		.expect("Failed to enqueue summary.");

	assert_eq!(queued.status, "pending");
	assert_eq!(again.job_id, queued.job_id);

	let finished = service
		.run_next_job()
		.await
		.expect("Worker iteration failed.")
		.expect("Expected a job to run.");
	let summary =
		service.get_summary(owner_id, note.note_id).await.expect("Summary must be stored.");

	assert_eq!(finished.job_id, queued.job_id);
	assert_eq!(finished.status, "completed");
	assert_eq!(finished.artifact_id, Some(summary.summary_id));
	assert_eq!(summary.ai_model, "gemini-2.5-flash");
	assert!(service.run_next_job().await.expect("Worker iteration failed.").is_none());

	let satisfied = service
		.enqueue_generation(GenerationKind::Summary, note.note_id, owner_id)
		.await
		.expect("Failed to enqueue summary.");

	assert_eq!(satisfied.status, "completed");
	assert_eq!(satisfied.artifact_id, Some(summary.summary_id));
	assert_eq!(collaborator.count(), 1);

	let stranger = service.get_job(Uuid::new_v4(), queued.job_id).await;

	assert!(matches!(stranger, Err(Error::NotFound { .. })));

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTES_PG_DSN to run."]
async fn failed_job_records_code_and_message() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping failed_job_records_code_and_message; set NOTES_PG_DSN to run this test.");

		return;
	};
	let collaborator = Arc::new(ScriptedCollaborator::failing());
	let service = super::build_service(&test_db, collaborator).await;
	let owner_id = Uuid::new_v4();
	let note = super::text_note(&service, owner_id).await;
	let queued = service
		.enqueue_generation(GenerationKind::Quiz, note.note_id, owner_id)
		.await
		.expect("Failed to enqueue quiz.");
	let finished = service
		.run_next_job()
		.await
		.expect("Worker iteration failed.")
		.expect("Expected a job to run.");

	assert_eq!(finished.job_id, queued.job_id);
	assert_eq!(finished.status, "failed");
	assert_eq!(finished.error_code.as_deref(), Some("collaborator_non_zero_exit"));
	assert_eq!(finished.error_message.as_deref(), Some(GENERIC_FAILURE_MESSAGE));

	let served = service.get_job(owner_id, queued.job_id).await.expect("Failed to fetch job.");
	let json = serde_json::to_string(&served).expect("Failed to serialize job.");

	assert!(!json.contains("generator crashed"));

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTES_PG_DSN to run."]
async fn pdf_generation_waits_for_extraction() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping pdf_generation_waits_for_extraction; set NOTES_PG_DSN to run this test.");

		return;
	};
	let collaborator = Arc::new(ScriptedCollaborator::replying(EXTRACT_AND_SUMMARY_REPLY));
	let service = super::build_service(&test_db, collaborator).await;
	let owner_id = Uuid::new_v4();
	let note = service
		.register_pdf_note(RegisterPdfNoteRequest {
			owner_id,
			title: "Biology".to_string(),
			file_ref: "uploads/biology.pdf".to_string(),
			file_size: 2_048,
		})
		.await
		.expect("Failed to register PDF.");

	assert_eq!(note.extraction_status.as_deref(), Some("pending"));
	assert!(matches!(
		service.request_generation(GenerationKind::Summary, note.note_id, owner_id).await,
		Err(Error::ExtractionPending { .. })
	));

	let extraction = service
		.run_next_job()
		.await
		.expect("Worker iteration failed.")
		.expect("Expected the extraction job.");

	assert_eq!(extraction.kind, "extract");
	assert_eq!(extraction.status, "completed");

	let stored = service.get_note(owner_id, note.note_id).await.expect("Missing note.");

	assert_eq!(stored.extraction_status.as_deref(), Some("completed"));

	service
		.request_generation(GenerationKind::Summary, note.note_id, owner_id)
		.await
		.expect("Summary of an extracted PDF failed.");

	let report = service.backfill_extractions().await.expect("Backfill failed.");

	assert_eq!(report.enqueued, 0);

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTES_PG_DSN to run."]
async fn extraction_abandoned_by_a_worker_can_be_backfilled() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping extraction_abandoned_by_a_worker_can_be_backfilled; set NOTES_PG_DSN to run this test."
		);

		return;
	};
	let collaborator = Arc::new(ScriptedCollaborator::replying(EXTRACT_AND_SUMMARY_REPLY));
	let service = super::build_service(&test_db, collaborator).await;
	let owner_id = Uuid::new_v4();
	let note = service
		.register_pdf_note(RegisterPdfNoteRequest {
			owner_id,
			title: "Biology".to_string(),
			file_ref: "uploads/biology.pdf".to_string(),
			file_size: 2_048,
		})
		.await
		.expect("Failed to register PDF.");
	// Claim the extract job with a lease that has already run out.
	let past = OffsetDateTime::now_utc() - time::Duration::seconds(120);
	let mut tx = service.db.pool.begin().await.expect("Failed to begin transaction.");
	let abandoned = jobs::lock_next_pending_job(&mut *tx)
		.await
		.expect("Failed to lock job.")
		.expect("Expected the extraction job.");

	assert_eq!(abandoned.kind, "extract");

	jobs::mark_job_running(&mut *tx, abandoned.job_id, past, past)
		.await
		.expect("Failed to mark job running.");
	tx.commit().await.expect("Failed to commit claim.");

	assert!(service.run_next_job().await.expect("Worker iteration failed.").is_none());

	let expired =
		service.get_job(owner_id, abandoned.job_id).await.expect("Failed to fetch job.");
	let stored = service.get_note(owner_id, note.note_id).await.expect("Missing note.");

	assert_eq!(expired.status, "failed");
	assert_eq!(expired.error_code.as_deref(), Some("lease_expired"));
	assert_eq!(stored.extraction_status.as_deref(), Some("failed"));
	assert!(matches!(
		service.request_generation(GenerationKind::Summary, note.note_id, owner_id).await,
		Err(Error::ExtractionFailed { .. })
	));

	let report = service.backfill_extractions().await.expect("Backfill failed.");

	assert_eq!(report.scanned, 1);
	assert_eq!(report.enqueued, 1);

	let extraction = service
		.run_next_job()
		.await
		.expect("Worker iteration failed.")
		.expect("Expected the requeued extraction job.");

	assert_eq!(extraction.kind, "extract");
	assert_eq!(extraction.status, "completed");

	service
		.request_generation(GenerationKind::Summary, note.note_id, owner_id)
		.await
		.expect("Summary of a recovered PDF failed.");

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTES_PG_DSN to run."]
async fn job_failed_while_running_is_not_completed() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping job_failed_while_running_is_not_completed; set NOTES_PG_DSN to run this test."
		);

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string());
	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	let collaborator = Arc::new(ExpiringCollaborator { pool: db.pool.clone() });
	let service = NotesService::with_collaborator(cfg, db, collaborator);
	let owner_id = Uuid::new_v4();
	let note = super::text_note(&service, owner_id).await;
	let queued = service
		.enqueue_generation(GenerationKind::Summary, note.note_id, owner_id)
		.await
		.expect("Failed to enqueue summary.");
	let finished = service
		.run_next_job()
		.await
		.expect("Worker iteration failed.")
		.expect("Expected a job to run.");

	assert_eq!(finished.job_id, queued.job_id);
	assert_eq!(finished.status, "failed");
	assert_eq!(finished.error_code.as_deref(), Some("lease_expired"));
	assert_eq!(finished.artifact_id, None);

	drop(service);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
