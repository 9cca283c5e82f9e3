//! Durable work queue backing the task runner.
//!
//! Each job row carries exactly one message: the id of the run to execute.
//! Workers claim rows with `FOR UPDATE SKIP LOCKED`, so a queued job is
//! handed to at most one worker.

use cfactory_core::RunKind;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::content_items::{approve_content_item_in, ContentItemRow};
use crate::runs::{create_run_in, RunRow};
use crate::DbError;

/// A row from the `run_jobs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobRow {
    pub id: i64,
    pub run_id: i64,
    pub status: String,
    pub attempts: i32,
    pub worker_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Job counts per queue status, used by the heartbeat log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueDepth {
    pub queued: i64,
    pub claimed: i64,
}

/// Creates a `pending` run and its queued job in one transaction.
///
/// Either both rows exist afterwards or neither does.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either insert or the commit fails.
pub async fn create_run_with_job(
    pool: &PgPool,
    kind: &str,
    config: &serde_json::Value,
    trigger_source: &str,
) -> Result<(RunRow, JobRow), DbError> {
    let mut tx = pool.begin().await?;

    let run = create_run_in(&mut tx, kind, config, trigger_source).await?;
    let job = enqueue_in(&mut tx, run.id).await?;

    tx.commit().await?;
    Ok((run, job))
}

/// Approves a content item and queues a `generation` run for it in one
/// transaction.
///
/// A rejected approval leaves no run behind, and a failed run insert leaves
/// the item in its previous status.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the item does not exist,
/// [`DbError::InvalidContentTransition`] if it cannot be approved, or
/// [`DbError::Sqlx`] if any write or the commit fails.
pub async fn approve_and_enqueue(
    pool: &PgPool,
    content_id: i64,
    config: &serde_json::Value,
    trigger_source: &str,
) -> Result<(ContentItemRow, RunRow, JobRow), DbError> {
    let mut tx = pool.begin().await?;

    let item = approve_content_item_in(&mut tx, content_id).await?;
    let run = create_run_in(&mut tx, RunKind::Generation.as_str(), config, trigger_source).await?;
    let job = enqueue_in(&mut tx, run.id).await?;

    tx.commit().await?;
    Ok((item, run, job))
}

async fn enqueue_in(conn: &mut PgConnection, run_id: i64) -> Result<JobRow, DbError> {
    let job = sqlx::query_as::<_, JobRow>(
        "INSERT INTO run_jobs (run_id, status) \
         VALUES ($1, 'queued') \
         RETURNING id, run_id, status, attempts, worker_id, error_message, \
                   created_at, claimed_at, finished_at",
    )
    .bind(run_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(job)
}

/// Claims up to `limit` queued jobs for `worker_id`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn claim_jobs(pool: &PgPool, worker_id: &str, limit: i64) -> Result<Vec<JobRow>, DbError> {
    if limit <= 0 {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, JobRow>(
        "UPDATE run_jobs \
         SET status = 'claimed', claimed_at = NOW(), worker_id = $1, attempts = attempts + 1 \
         WHERE id IN ( \
             SELECT id FROM run_jobs \
             WHERE status = 'queued' \
             ORDER BY created_at, id \
             LIMIT $2 \
             FOR UPDATE SKIP LOCKED \
         ) \
         RETURNING id, run_id, status, attempts, worker_id, error_message, \
                   created_at, claimed_at, finished_at",
    )
    .bind(worker_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Marks a claimed job as `done`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no claimed job has this id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_job(pool: &PgPool, job_id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE run_jobs SET status = 'done', finished_at = NOW() \
         WHERE id = $1 AND status = 'claimed'",
    )
    .bind(job_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Marks a claimed job as `failed` with the error that stopped it.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no claimed job has this id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_job(pool: &PgPool, job_id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE run_jobs SET status = 'failed', finished_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'claimed'",
    )
    .bind(error_message)
    .bind(job_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Fetches the job row belonging to a run.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the run has no job, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_job_for_run(pool: &PgPool, run_id: i64) -> Result<JobRow, DbError> {
    sqlx::query_as::<_, JobRow>(
        "SELECT id, run_id, status, attempts, worker_id, error_message, \
                created_at, claimed_at, finished_at \
         FROM run_jobs WHERE run_id = $1",
    )
    .bind(run_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Counts queued and claimed jobs.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_jobs_by_status(pool: &PgPool) -> Result<QueueDepth, DbError> {
    let (queued, claimed) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT \
             COUNT(*) FILTER (WHERE status = 'queued'), \
             COUNT(*) FILTER (WHERE status = 'claimed') \
         FROM run_jobs",
    )
    .fetch_one(pool)
    .await?;

    Ok(QueueDepth { queued, claimed })
}
