//! Database operations for `content_items`.
//!
//! Status flow: `pending → scoring → scored → approved → completed`, with
//! `archived` reachable from any settled state. `scoring` is the claim a
//! scoring worker holds; only the claimant's `record_score` moves it on.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `content_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContentItemRow {
    pub id: i64,
    pub url: String,
    pub platform: String,
    pub caption: Option<String>,
    pub metadata: serde_json::Value,
    pub status: String,
    pub score: Option<f64>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItemRow {
    #[must_use]
    pub fn view(&self) -> cfactory_core::ContentView<'_> {
        cfactory_core::ContentView {
            url: &self.url,
            caption: self.caption.as_deref(),
            metadata: &self.metadata,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewContentItem<'a> {
    pub url: &'a str,
    pub platform: &'a str,
    pub caption: Option<&'a str>,
    pub metadata: &'a serde_json::Value,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts a `pending` item unless its URL is already stored.
///
/// Returns `true` when a row was written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_content_item_if_absent(
    pool: &PgPool,
    item: &NewContentItem<'_>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO content_items (url, platform, caption, metadata, status) \
         VALUES ($1, $2, $3, $4, 'pending') \
         ON CONFLICT (url) DO NOTHING",
    )
    .bind(item.url)
    .bind(item.platform)
    .bind(item.caption)
    .bind(item.metadata)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Atomically moves up to `limit` pending items to `scoring` and returns them.
///
/// Concurrent callers never receive the same item.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn claim_pending_for_scoring(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<ContentItemRow>, DbError> {
    let rows = sqlx::query_as::<_, ContentItemRow>(
        "UPDATE content_items \
         SET status = 'scoring', claimed_at = NOW(), updated_at = NOW() \
         WHERE id IN ( \
             SELECT id FROM content_items \
             WHERE status = 'pending' \
             ORDER BY created_at, id \
             LIMIT $1 \
             FOR UPDATE SKIP LOCKED \
         ) \
         RETURNING id, url, platform, caption, metadata, status, score, \
                   claimed_at, created_at, updated_at",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Stores a relevance score and moves the item from `scoring` to `scored`.
///
/// The score is clamped to `[0, 100]`; a non-finite score is stored as `0`.
///
/// # Errors
///
/// Returns [`DbError::InvalidContentTransition`] if the item is not held in
/// `scoring`, or [`DbError::Sqlx`] if the update fails.
pub async fn record_score(pool: &PgPool, id: i64, score: f64) -> Result<(), DbError> {
    let score = clamp_score(score);
    let result = sqlx::query(
        "UPDATE content_items \
         SET score = $1, status = 'scored', claimed_at = NULL, updated_at = NOW() \
         WHERE id = $2 AND status = 'scoring'",
    )
    .bind(score)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidContentTransition {
            id,
            expected_status: "scoring",
        });
    }
    Ok(())
}

/// Returns a claimed item to `pending` so a later scoring run can pick it up.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn release_scoring_claim(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE content_items \
         SET status = 'pending', claimed_at = NULL, updated_at = NOW() \
         WHERE id = $1 AND status = 'scoring'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Marks an item `approved` for generation.
///
/// Accepted from `pending`, `scored`, or `approved` (re-approval after a
/// failed generation).
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the item does not exist,
/// [`DbError::InvalidContentTransition`] if it is completed, archived, or
/// mid-scoring, or [`DbError::Sqlx`] if the update fails.
pub async fn approve_content_item(pool: &PgPool, id: i64) -> Result<ContentItemRow, DbError> {
    let mut conn = pool.acquire().await?;
    approve_content_item_in(&mut conn, id).await
}

pub(crate) async fn approve_content_item_in(
    conn: &mut PgConnection,
    id: i64,
) -> Result<ContentItemRow, DbError> {
    transition(
        conn,
        id,
        "UPDATE content_items SET status = 'approved', updated_at = NOW() \
         WHERE id = $1 AND status IN ('pending', 'scored', 'approved') \
         RETURNING id, url, platform, caption, metadata, status, score, \
                   claimed_at, created_at, updated_at",
        "pending, scored, or approved",
    )
    .await
}

/// Marks an item `archived`, removing it from the working queue.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the item does not exist,
/// [`DbError::InvalidContentTransition`] if it is mid-scoring or already
/// archived, or [`DbError::Sqlx`] if the update fails.
pub async fn archive_content_item(pool: &PgPool, id: i64) -> Result<ContentItemRow, DbError> {
    let mut conn = pool.acquire().await?;
    transition(
        &mut conn,
        id,
        "UPDATE content_items SET status = 'archived', updated_at = NOW() \
         WHERE id = $1 AND status IN ('pending', 'scored', 'approved', 'completed') \
         RETURNING id, url, platform, caption, metadata, status, score, \
                   claimed_at, created_at, updated_at",
        "pending, scored, approved, or completed",
    )
    .await
}

pub(crate) async fn mark_content_completed_in(
    conn: &mut PgConnection,
    id: i64,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE content_items SET status = 'completed', updated_at = NOW() \
         WHERE id = $1 AND status <> 'archived'",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidContentTransition {
            id,
            expected_status: "not archived",
        });
    }
    Ok(())
}

async fn transition(
    conn: &mut PgConnection,
    id: i64,
    sql: &str,
    expected_status: &'static str,
) -> Result<ContentItemRow, DbError> {
    if let Some(row) = sqlx::query_as::<_, ContentItemRow>(sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    {
        return Ok(row);
    }

    // Distinguish a missing row from one in the wrong state.
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM content_items WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
    if !exists {
        return Err(DbError::NotFound);
    }
    Err(DbError::InvalidContentTransition {
        id,
        expected_status,
    })
}

fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Fetches one item by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if absent, or [`DbError::Sqlx`] on failure.
pub async fn get_content_item(pool: &PgPool, id: i64) -> Result<ContentItemRow, DbError> {
    sqlx::query_as::<_, ContentItemRow>(
        "SELECT id, url, platform, caption, metadata, status, score, \
                claimed_at, created_at, updated_at \
         FROM content_items WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Lists items, optionally filtered by status, highest score first.
///
/// Unscored items sort last.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_content_items(
    pool: &PgPool,
    status: Option<&str>,
    limit: i64,
) -> Result<Vec<ContentItemRow>, DbError> {
    let rows = sqlx::query_as::<_, ContentItemRow>(
        "SELECT id, url, platform, caption, metadata, status, score, \
                claimed_at, created_at, updated_at \
         FROM content_items \
         WHERE ($1::TEXT IS NULL OR status = $1) \
         ORDER BY score DESC NULLS LAST, created_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(status)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::clamp_score;

    #[test]
    fn clamp_score_bounds_and_nan() {
        assert!((clamp_score(150.0) - 100.0).abs() < f64::EPSILON);
        assert!(clamp_score(-3.0).abs() < f64::EPSILON);
        assert!((clamp_score(42.5) - 42.5).abs() < f64::EPSILON);
        assert!(clamp_score(f64::NAN).abs() < f64::EPSILON);
    }
}
