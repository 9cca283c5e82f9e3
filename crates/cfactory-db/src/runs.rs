//! Database operations for the `runs` ledger.
//!
//! Every transition is a conditional `UPDATE ... WHERE status = ...`, so a
//! terminal run can never be moved again. When the update matches nothing,
//! a follow-up existence check tells an unknown id ([`DbError::NotFound`])
//! apart from a run in the wrong state ([`DbError::InvalidRunTransition`]).

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub kind: String,
    pub status: String,
    pub config: serde_json::Value,
    pub stats: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub trigger_source: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// Creates a new run in `pending` status.
///
/// `kind` is stored as given; validating it is the task runner's job so that
/// an unrecognised kind still leaves a failed run behind.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_run(
    pool: &PgPool,
    kind: &str,
    config: &serde_json::Value,
    trigger_source: &str,
) -> Result<RunRow, DbError> {
    let mut conn = pool.acquire().await?;
    create_run_in(&mut conn, kind, config, trigger_source).await
}

pub(crate) async fn create_run_in(
    conn: &mut PgConnection,
    kind: &str,
    config: &serde_json::Value,
    trigger_source: &str,
) -> Result<RunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, RunRow>(
        "INSERT INTO runs (public_id, kind, status, config, trigger_source) \
         VALUES ($1, $2, 'pending', $3, $4) \
         RETURNING id, public_id, kind, status, config, stats, error_message, \
                   trigger_source, created_at, started_at, finished_at",
    )
    .bind(public_id)
    .bind(kind)
    .bind(config)
    .bind(trigger_source)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Moves a run from `pending` to `running` and stamps `started_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] for an unknown id,
/// [`DbError::InvalidRunTransition`] if the run is not `pending`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn mark_run_running(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let mut conn = pool.acquire().await?;
    let result = sqlx::query(
        "UPDATE runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'pending'",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(transition_error(&mut conn, id, "pending").await);
    }

    Ok(())
}

/// Moves a run from `running` to `completed`, storing `stats`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] for an unknown id,
/// [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn mark_run_completed(
    pool: &PgPool,
    id: i64,
    stats: &serde_json::Value,
) -> Result<(), DbError> {
    let mut conn = pool.acquire().await?;
    mark_run_completed_in(&mut conn, id, stats).await
}

pub(crate) async fn mark_run_completed_in(
    conn: &mut PgConnection,
    id: i64,
    stats: &serde_json::Value,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE runs \
         SET status = 'completed', finished_at = NOW(), stats = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(stats)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(transition_error(conn, id, "running").await);
    }

    Ok(())
}

/// Moves a run from `pending` or `running` to `failed`, storing the error text.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] for an unknown id,
/// [`DbError::InvalidRunTransition`] if the run is already terminal, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn mark_run_failed(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let mut conn = pool.acquire().await?;
    let result = sqlx::query(
        "UPDATE runs \
         SET status = 'failed', finished_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status IN ('pending', 'running')",
    )
    .bind(error_message)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(transition_error(&mut conn, id, "pending or running").await);
    }

    Ok(())
}

/// Builds the error for an update that matched no rows.
async fn transition_error(
    conn: &mut PgConnection,
    id: i64,
    expected_status: &'static str,
) -> DbError {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM runs WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await;

    match exists {
        Ok(true) => DbError::InvalidRunTransition {
            id,
            expected_status,
        },
        Ok(false) => DbError::NotFound,
        Err(e) => DbError::Sqlx(e),
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_run(pool: &PgPool, id: i64) -> Result<RunRow, DbError> {
    sqlx::query_as::<_, RunRow>(
        "SELECT id, public_id, kind, status, config, stats, error_message, \
                trigger_source, created_at, started_at, finished_at \
         FROM runs \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Fetches a single run by the identifier exposed over the API.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_run_by_public_id(pool: &PgPool, public_id: Uuid) -> Result<RunRow, DbError> {
    sqlx::query_as::<_, RunRow>(
        "SELECT id, public_id, kind, status, config, stats, error_message, \
                trigger_source, created_at, started_at, finished_at \
         FROM runs \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_runs(pool: &PgPool, limit: i64) -> Result<Vec<RunRow>, DbError> {
    let rows = sqlx::query_as::<_, RunRow>(
        "SELECT id, public_id, kind, status, config, stats, error_message, \
                trigger_source, created_at, started_at, finished_at \
         FROM runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
