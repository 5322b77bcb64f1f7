//! Queued generation work and its status machine.
//!
//! A job moves `pending -> running -> completed | failed`. A summary request that is already
//! satisfied is recorded directly as `completed`.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, MAX_ERROR_MESSAGE_CHARS, NotesService, Result};
use notes_domain::{
	job::{self, GenerationKind, JobKind, JobStatus},
	redact,
};
use notes_storage::{jobs, models::GenerationJob, queries};

const LEASE_EXPIRED_EXTRACTION: &str =
	"lease_expired: extraction did not finish before its job lease expired.";

#[derive(Clone, Debug, Serialize)]
pub struct JobView {
	pub job_id: Uuid,
	pub note_id: Uuid,
	pub kind: String,
	pub status: String,
	pub artifact_id: Option<Uuid>,
	pub error_code: Option<String>,
	pub error_message: Option<String>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}
impl From<GenerationJob> for JobView {
	fn from(row: GenerationJob) -> Self {
		Self {
			job_id: row.job_id,
			note_id: row.note_id,
			kind: row.kind,
			status: row.status,
			artifact_id: row.artifact_id,
			error_code: row.error_code,
			error_message: row.error_message,
			created_at: row.created_at,
			updated_at: row.updated_at,
		}
	}
}

impl NotesService {
	/// Queues a summary or quiz for background generation.
	///
	/// An active job of the same kind for the note is returned instead of a new one.
	pub async fn enqueue_generation(
		&self,
		kind: GenerationKind,
		note_id: Uuid,
		owner_id: Uuid,
	) -> Result<JobView> {
		let note = self.owned_note(owner_id, note_id).await?;
		let job_kind = JobKind::from(kind);
		let now = OffsetDateTime::now_utc();

		if kind == GenerationKind::Summary
			&& let Some(summary) = queries::fetch_summary(&self.db.pool, owner_id, note_id).await?
		{
			let status = job::transition(JobStatus::Pending, JobStatus::Completed)?;
			let mut job = crate::notes::pending_job(&note, job_kind, now);

			job.status = status.as_str().to_string();
			job.artifact_id = Some(summary.summary_id);

			jobs::insert_job(&self.db.pool, &job).await?;

			return Ok(job.into());
		}

		if let Some(active) =
			jobs::fetch_active_job(&self.db.pool, owner_id, note_id, job_kind.as_str()).await?
		{
			return Ok(active.into());
		}

		let job = crate::notes::pending_job(&note, job_kind, now);

		if jobs::insert_job(&self.db.pool, &job).await? {
			tracing::info!(job_id = %job.job_id, note_id = %note_id, kind = job_kind.as_str(), "Queued generation job.");

			return Ok(job.into());
		}

		// Lost the race against another enqueue for the same note and kind.
		jobs::fetch_active_job(&self.db.pool, owner_id, note_id, job_kind.as_str())
			.await?
			.map(JobView::from)
			.ok_or_else(|| Error::Conflict {
				message: "Generation job changed state while being queued.".to_string(),
			})
	}

	pub async fn get_job(&self, owner_id: Uuid, job_id: Uuid) -> Result<JobView> {
		jobs::fetch_job(&self.db.pool, owner_id, job_id)
			.await?
			.map(JobView::from)
			.ok_or_else(|| Error::not_found("Job"))
	}

	/// Runs the oldest pending job, if any, and returns it in its final state.
	///
	/// Running jobs whose lease expired are failed first. Job failures are recorded on the
	/// job with a caller-safe message; only storage errors are returned.
	pub async fn run_next_job(&self) -> Result<Option<JobView>> {
		let now = OffsetDateTime::now_utc();

		self.fail_expired_jobs(now).await?;

		let Some((job, status)) = self.claim_next_job(now).await? else {
			return Ok(None);
		};

		tracing::info!(job_id = %job.job_id, kind = %job.kind, note_id = %job.note_id, "Running job.");

		let outcome = self.execute_job(&job).await;
		let next = if outcome.is_ok() { JobStatus::Completed } else { JobStatus::Failed };
		let current = self.stored_status(&job).await?.unwrap_or(status);

		if let Err(err) = job::transition(current, next) {
			tracing::warn!(job_id = %job.job_id, error = %err, "Job changed state while running.");

			let stored = jobs::fetch_job(&self.db.pool, job.owner_id, job.job_id).await?;

			return Ok(stored.map(JobView::from));
		}

		let finished_at = OffsetDateTime::now_utc();
		let updated = match outcome {
			Ok(artifact_id) =>
				jobs::mark_job_completed(&self.db.pool, job.job_id, artifact_id, finished_at).await?,
			Err(err) => {
				tracing::error!(job_id = %job.job_id, error_code = err.code(), error = %err, "Job failed.");

				let message =
					redact::sanitize_error_text(&err.public_message(), MAX_ERROR_MESSAGE_CHARS);

				jobs::mark_job_failed(&self.db.pool, job.job_id, err.code(), &message, finished_at)
					.await?
			},
		};

		if updated == 0 {
			tracing::warn!(job_id = %job.job_id, "Job was no longer running when it finished.");
		}

		let stored = jobs::fetch_job(&self.db.pool, job.owner_id, job.job_id).await?;

		Ok(stored.map(JobView::from))
	}

	/// Fails running jobs past their lease. An expired extract job also fails its note's
	/// extraction so backfill can queue it again.
	async fn fail_expired_jobs(&self, now: OffsetDateTime) -> Result<()> {
		let mut tx = self.db.pool.begin().await?;
		let expired = jobs::fail_expired_jobs(&mut *tx, now).await?;

		for job in &expired {
			if JobKind::parse(&job.kind) == Some(JobKind::Extract) {
				queries::fail_extraction(&mut *tx, job.note_id, LEASE_EXPIRED_EXTRACTION, now).await?;
			}
		}

		tx.commit().await?;

		if !expired.is_empty() {
			tracing::warn!(expired = expired.len(), "Failed jobs whose lease expired.");
		}

		Ok(())
	}

	/// Moves the oldest pending job to `running` under a lease.
	async fn claim_next_job(
		&self,
		now: OffsetDateTime,
	) -> Result<Option<(GenerationJob, JobStatus)>> {
		let mut tx = self.db.pool.begin().await?;
		let Some(mut job) = jobs::lock_next_pending_job(&mut *tx).await? else {
			tx.commit().await?;

			return Ok(None);
		};
		let current = parse_status(&job)?;
		let status = job::transition(current, JobStatus::Running)?;
		let lease_until = now + time::Duration::seconds(self.cfg.worker.lease_seconds);

		jobs::mark_job_running(&mut *tx, job.job_id, lease_until, now).await?;
		tx.commit().await?;

		job.status = status.as_str().to_string();
		job.lease_until = Some(lease_until);
		job.updated_at = now;

		Ok(Some((job, status)))
	}

	async fn stored_status(&self, job: &GenerationJob) -> Result<Option<JobStatus>> {
		let Some(stored) = jobs::fetch_job(&self.db.pool, job.owner_id, job.job_id).await? else {
			return Ok(None);
		};

		parse_status(&stored).map(Some)
	}

	async fn execute_job(&self, job: &GenerationJob) -> Result<Option<Uuid>> {
		let kind = JobKind::parse(&job.kind)
			.ok_or_else(|| Error::validation(format!("Unknown job kind {}.", job.kind)))?;
		let note = self.owned_note(job.owner_id, job.note_id).await?;

		match kind {
			JobKind::Summary => self.summarize(&note).await.map(|summary| Some(summary.summary_id)),
			JobKind::Quiz => self.generate_quiz(&note).await.map(|quiz| Some(quiz.quiz_id)),
			JobKind::Extract => self.extract_note(&note).await.map(|()| None),
		}
	}
}

fn parse_status(job: &GenerationJob) -> Result<JobStatus> {
	JobStatus::parse(&job.status).ok_or_else(|| Error::Conflict {
		message: format!("Job {} has unknown status {}.", job.job_id, job.status),
	})
}
