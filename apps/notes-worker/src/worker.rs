use std::time::Duration;

use tokio::time as tokio_time;

use notes_service::NotesService;

pub struct WorkerState {
	pub service: NotesService,
	pub poll_interval: Duration,
}

/// Polls the job queue forever. A failed iteration is logged and the loop keeps going.
pub async fn run_worker(state: WorkerState) -> color_eyre::Result<()> {
	tracing::info!(poll_interval_ms = state.poll_interval.as_millis() as u64, "Worker started.");

	loop {
		match run_once(&state).await {
			Ok(true) => continue,
			Ok(false) => {},
			Err(err) => {
				tracing::error!(error = %err, "Job queue processing failed.");
			},
		}

		tokio_time::sleep(state.poll_interval).await;
	}
}

/// Runs at most one job. Returns whether a job was claimed.
pub async fn run_once(state: &WorkerState) -> notes_service::Result<bool> {
	let Some(job) = state.service.run_next_job().await? else {
		return Ok(false);
	};

	match job.status.as_str() {
		"failed" => tracing::warn!(
			job_id = %job.job_id,
			kind = %job.kind,
			error_code = job.error_code.as_deref().unwrap_or_default(),
			"Job failed."
		),
		_ => tracing::info!(job_id = %job.job_id, kind = %job.kind, status = %job.status, "Job finished."),
	}

	Ok(true)
}
