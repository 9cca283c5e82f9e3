//! Queries used by the crash-recovery sweep.
//!
//! A worker that dies mid-run leaves a `running` run (or a `pending` run
//! behind a claimed job), possibly a draft plan, and possibly items held in
//! `scoring`. These statements find and settle each of those.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// Fails runs that have been in flight since before `cutoff`.
///
/// Covers `running` runs started before the cutoff and `pending` runs whose
/// job was claimed before it. Returns the ids of the runs it failed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn fail_stale_runs(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
    error_message: &str,
) -> Result<Vec<i64>, DbError> {
    let ids = sqlx::query_scalar::<_, i64>(
        "UPDATE runs \
         SET status = 'failed', finished_at = NOW(), error_message = $2 \
         WHERE (status = 'running' AND started_at < $1) \
            OR (status = 'pending' AND id IN ( \
                    SELECT run_id FROM run_jobs \
                    WHERE status = 'claimed' AND claimed_at < $1)) \
         RETURNING id",
    )
    .bind(cutoff)
    .bind(error_message)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Fails any still-open jobs belonging to the given runs.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn fail_jobs_for_runs(
    pool: &PgPool,
    run_ids: &[i64],
    error_message: &str,
) -> Result<u64, DbError> {
    if run_ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        "UPDATE run_jobs \
         SET status = 'failed', finished_at = NOW(), error_message = $2 \
         WHERE run_id = ANY($1) AND status IN ('queued', 'claimed')",
    )
    .bind(run_ids)
    .bind(error_message)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Deletes draft plans whose owning run has failed and that never got a carousel.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_orphaned_draft_plans(pool: &PgPool) -> Result<u64, DbError> {
    let result = sqlx::query(
        "DELETE FROM carousel_plans p \
         WHERE p.status = 'draft' \
           AND p.run_id IN (SELECT id FROM runs WHERE status = 'failed') \
           AND NOT EXISTS (SELECT 1 FROM carousels c WHERE c.plan_id = p.id)",
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Returns items claimed for scoring before `cutoff` to `pending`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn release_stale_scoring_claims(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE content_items \
         SET status = 'pending', claimed_at = NULL, updated_at = NOW() \
         WHERE status = 'scoring' AND claimed_at < $1",
    )
    .bind(cutoff)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
