use std::{sync::Arc, time::Duration};

use serde_json::Map;
use uuid::Uuid;

use notes_config::{
	Collaborator, Config, Generation, Postgres, Security, Service, Storage, Worker,
};
use notes_domain::job::GenerationKind;
use notes_providers::CollaboratorRequest;
use notes_service::{BoxFuture, CreateTextNoteRequest, GenerationCollaborator, NotesService};
use notes_storage::db::Db;
use notes_testkit::TestDatabase;
use notes_worker::worker::{self, WorkerState};

struct SummaryOnly;
impl GenerationCollaborator for SummaryOnly {
	fn invoke<'a>(
		&'a self,
		_cfg: &'a Collaborator,
		_request: &'a CollaboratorRequest,
	) -> BoxFuture<'a, notes_providers::Result<String>> {
		Box::pin(async move { Ok("{\"success\": true, \"summary\": \"Short.\"}".to_string()) })
	}
}

fn test_config(dsn: String) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			admin_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		storage: Storage { postgres: Postgres { dsn, pool_max_conns: 1 } },
		collaborator: Collaborator {
			transport: "process".to_string(),
			program: "true".to_string(),
			args: Vec::new(),
			url: String::new(),
			api_key: None,
			timeout_ms: 1_000,
			default_headers: Map::new(),
		},
		generation: Generation::default(),
		worker: Worker { poll_interval_ms: 10, lease_seconds: 60 },
		security: Security {
			bind_localhost_only: true,
			api_auth_token: None,
			admin_auth_token: None,
		},
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set NOTES_PG_DSN to run."]
async fn run_once_drains_one_job_then_reports_idle() {
	let Some(base_dsn) = notes_testkit::env_dsn() else {
		eprintln!(
			"Skipping run_once_drains_one_job_then_reports_idle; set NOTES_PG_DSN to run this test."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = test_config(test_db.dsn().to_string());
	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	let service = NotesService::with_collaborator(cfg, db, Arc::new(SummaryOnly));
	let owner_id = Uuid::new_v4();
	let note = service
		.create_text_note(CreateTextNoteRequest {
			owner_id,
			title: "Cells".to_string(),
			content: "Cells divide.".to_string(),
		})
		.await
		.expect("Failed to create note.");
	let job = service
		.enqueue_generation(GenerationKind::Summary, note.note_id, owner_id)
		.await
		.expect("Failed to enqueue job.");
	let state = WorkerState { service, poll_interval: Duration::from_millis(10) };

	assert!(worker::run_once(&state).await.expect("Worker iteration failed."));
	assert!(!worker::run_once(&state).await.expect("Worker iteration failed."));

	let finished = state.service.get_job(owner_id, job.job_id).await.expect("Missing job.");

	assert_eq!(finished.status, "completed");

	drop(state);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
