use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, models::GenerationJob};

/// Inserts a job unless an active one already exists for the same note, owner, and kind.
///
/// Returns `false` when the active-job index rejected the insert.
pub async fn insert_job<'e, E>(executor: E, job: &GenerationJob) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO generation_jobs (
	job_id,
	owner_id,
	note_id,
	kind,
	status,
	artifact_id,
	error_code,
	error_message,
	lease_until,
	created_at,
	updated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
ON CONFLICT (note_id, owner_id, kind) WHERE status IN ('pending', 'running') DO NOTHING",
	)
	.bind(job.job_id)
	.bind(job.owner_id)
	.bind(job.note_id)
	.bind(job.kind.as_str())
	.bind(job.status.as_str())
	.bind(job.artifact_id)
	.bind(job.error_code.as_deref())
	.bind(job.error_message.as_deref())
	.bind(job.lease_until)
	.bind(job.created_at)
	.bind(job.updated_at)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() == 1)
}

pub async fn fetch_job<'e, E>(executor: E, owner_id: Uuid, job_id: Uuid) -> Result<Option<GenerationJob>>
where
	E: PgExecutor<'e>,
{
	let job = sqlx::query_as::<_, GenerationJob>(
		"SELECT * FROM generation_jobs WHERE job_id = $1 AND owner_id = $2",
	)
	.bind(job_id)
	.bind(owner_id)
	.fetch_optional(executor)
	.await?;

	Ok(job)
}

pub async fn fetch_active_job<'e, E>(
	executor: E,
	owner_id: Uuid,
	note_id: Uuid,
	kind: &str,
) -> Result<Option<GenerationJob>>
where
	E: PgExecutor<'e>,
{
	let job = sqlx::query_as::<_, GenerationJob>(
		"\
SELECT *
FROM generation_jobs
WHERE note_id = $1
	AND owner_id = $2
	AND kind = $3
	AND status IN ('pending', 'running')
LIMIT 1",
	)
	.bind(note_id)
	.bind(owner_id)
	.bind(kind)
	.fetch_optional(executor)
	.await?;

	Ok(job)
}

/// Locks the oldest pending job for the caller's transaction, skipping rows other workers hold.
pub async fn lock_next_pending_job<'e, E>(executor: E) -> Result<Option<GenerationJob>>
where
	E: PgExecutor<'e>,
{
	let job = sqlx::query_as::<_, GenerationJob>(
		"\
SELECT *
FROM generation_jobs
WHERE status = 'pending'
ORDER BY created_at ASC, job_id ASC
LIMIT 1
FOR UPDATE SKIP LOCKED",
	)
	.fetch_optional(executor)
	.await?;

	Ok(job)
}

pub async fn mark_job_running<'e, E>(
	executor: E,
	job_id: Uuid,
	lease_until: OffsetDateTime,
	now: OffsetDateTime,
) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE generation_jobs
SET status = 'running',
	lease_until = $1,
	updated_at = $2
WHERE job_id = $3 AND status = 'pending'",
	)
	.bind(lease_until)
	.bind(now)
	.bind(job_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}

pub async fn mark_job_completed<'e, E>(
	executor: E,
	job_id: Uuid,
	artifact_id: Option<Uuid>,
	now: OffsetDateTime,
) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE generation_jobs
SET status = 'completed',
	artifact_id = $1,
	lease_until = NULL,
	updated_at = $2
WHERE job_id = $3 AND status = 'running'",
	)
	.bind(artifact_id)
	.bind(now)
	.bind(job_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}

pub async fn mark_job_failed<'e, E>(
	executor: E,
	job_id: Uuid,
	error_code: &str,
	error_message: &str,
	now: OffsetDateTime,
) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE generation_jobs
SET status = 'failed',
	error_code = $1,
	error_message = $2,
	lease_until = NULL,
	updated_at = $3
WHERE job_id = $4 AND status = 'running'",
	)
	.bind(error_code)
	.bind(error_message)
	.bind(now)
	.bind(job_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}

/// Running jobs whose lease ran out are failed rather than retried.
///
/// Returns the failed jobs so callers can settle state tied to them.
pub async fn fail_expired_jobs<'e, E>(
	executor: E,
	now: OffsetDateTime,
) -> Result<Vec<GenerationJob>>
where
	E: PgExecutor<'e>,
{
	let expired = sqlx::query_as::<_, GenerationJob>(
		"\
UPDATE generation_jobs
SET status = 'failed',
	error_code = 'lease_expired',
	error_message = 'Job did not finish before its lease expired.',
	lease_until = NULL,
	updated_at = $1
WHERE status = 'running' AND lease_until < $1
RETURNING *",
	)
	.bind(now)
	.fetch_all(executor)
	.await?;

	Ok(expired)
}
