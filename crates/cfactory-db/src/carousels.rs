//! Database operations for `carousel_plans` and `carousels`.
//!
//! A generation run writes its plan as `draft` first, keyed by `run_id`.
//! [`finalize_generation`] later promotes it in a single transaction together
//! with the carousel row, the source item, and the run itself. A draft that
//! outlives its run is an orphan the recovery pass deletes.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::content_items::mark_content_completed_in;
use crate::runs::mark_run_completed_in;
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `carousel_plans` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlanRow {
    pub id: i64,
    pub source_id: i64,
    pub run_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub structure: serde_json::Value,
    pub status: String,
    pub theme: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `carousels` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CarouselRow {
    pub id: i64,
    pub plan_id: i64,
    pub object_key: String,
    pub thumbnail_key: Option<String>,
    pub slide_count: i32,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A carousel joined with the plan it was rendered from.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CarouselListRow {
    pub id: i64,
    pub plan_id: i64,
    pub source_id: i64,
    pub title: String,
    pub theme: String,
    pub object_key: String,
    pub slide_count: i32,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPlan<'a> {
    pub source_id: i64,
    pub run_id: i64,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub structure: &'a serde_json::Value,
    pub theme: &'a str,
}

/// Everything the finalize transaction writes.
#[derive(Debug, Clone)]
pub struct FinalizeGeneration<'a> {
    pub run_id: i64,
    pub plan_id: i64,
    pub content_id: i64,
    pub object_key: &'a str,
    pub slide_count: i32,
    pub stats: &'a serde_json::Value,
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// Inserts a `draft` plan owned by a generation run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a unique
/// violation when the run already owns a plan.
pub async fn insert_draft_plan(pool: &PgPool, plan: &NewPlan<'_>) -> Result<PlanRow, DbError> {
    let row = sqlx::query_as::<_, PlanRow>(
        "INSERT INTO carousel_plans \
             (source_id, run_id, title, description, structure, status, theme) \
         VALUES ($1, $2, $3, $4, $5, 'draft', $6) \
         RETURNING id, source_id, run_id, title, description, structure, status, theme, \
                   created_at, updated_at",
    )
    .bind(plan.source_id)
    .bind(plan.run_id)
    .bind(plan.title)
    .bind(plan.description)
    .bind(plan.structure)
    .bind(plan.theme)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Deletes a plan that is still `draft` and has no carousel.
///
/// Returns `true` if a row was removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_draft_plan(pool: &PgPool, plan_id: i64) -> Result<bool, DbError> {
    let result = sqlx::query(
        "DELETE FROM carousel_plans p \
         WHERE p.id = $1 AND p.status = 'draft' \
           AND NOT EXISTS (SELECT 1 FROM carousels c WHERE c.plan_id = p.id)",
    )
    .bind(plan_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Fetches one plan by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if absent, or [`DbError::Sqlx`] on failure.
pub async fn get_plan(pool: &PgPool, id: i64) -> Result<PlanRow, DbError> {
    sqlx::query_as::<_, PlanRow>(
        "SELECT id, source_id, run_id, title, description, structure, status, theme, \
                created_at, updated_at \
         FROM carousel_plans WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

// ---------------------------------------------------------------------------
// Finalize
// ---------------------------------------------------------------------------

/// Commits a finished generation atomically.
///
/// Inserts the carousel, promotes the plan from `draft` to `ready`, marks the
/// source item `completed`, and completes the run with `stats` plus the new
/// `carousel_id`. Any failure rolls back all four writes.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the plan is no longer a draft,
/// [`DbError::InvalidRunTransition`] if the run is not `running`,
/// [`DbError::InvalidContentTransition`] if the item was archived meanwhile,
/// or [`DbError::Sqlx`] on any statement failure.
pub async fn finalize_generation(
    pool: &PgPool,
    input: &FinalizeGeneration<'_>,
) -> Result<CarouselRow, DbError> {
    let mut tx = pool.begin().await?;

    let promoted = sqlx::query(
        "UPDATE carousel_plans SET status = 'ready', updated_at = NOW() \
         WHERE id = $1 AND status = 'draft'",
    )
    .bind(input.plan_id)
    .execute(&mut *tx)
    .await?;
    if promoted.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    let carousel = sqlx::query_as::<_, CarouselRow>(
        "INSERT INTO carousels (plan_id, object_key, slide_count, status) \
         VALUES ($1, $2, $3, 'ready') \
         RETURNING id, plan_id, object_key, thumbnail_key, slide_count, status, \
                   published_at, created_at, updated_at",
    )
    .bind(input.plan_id)
    .bind(input.object_key)
    .bind(input.slide_count)
    .fetch_one(&mut *tx)
    .await?;

    let mut stats = input.stats.clone();
    if let Some(fields) = stats.as_object_mut() {
        fields.insert("carousel_id".to_string(), carousel.id.into());
    }

    mark_content_completed_in(&mut tx, input.content_id).await?;
    mark_run_completed_in(&mut tx, input.run_id, &stats).await?;

    tx.commit().await?;
    Ok(carousel)
}

// ---------------------------------------------------------------------------
// Carousels
// ---------------------------------------------------------------------------

/// Fetches one carousel by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if absent, or [`DbError::Sqlx`] on failure.
pub async fn get_carousel(pool: &PgPool, id: i64) -> Result<CarouselRow, DbError> {
    sqlx::query_as::<_, CarouselRow>(
        "SELECT id, plan_id, object_key, thumbnail_key, slide_count, status, \
                published_at, created_at, updated_at \
         FROM carousels WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Lists carousels with their plan title, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_carousels(pool: &PgPool, limit: i64) -> Result<Vec<CarouselListRow>, DbError> {
    let rows = sqlx::query_as::<_, CarouselListRow>(
        "SELECT c.id, c.plan_id, p.source_id, p.title, p.theme, c.object_key, \
                c.slide_count, c.status, c.published_at, c.created_at \
         FROM carousels c \
         JOIN carousel_plans p ON p.id = c.plan_id \
         ORDER BY c.created_at DESC, c.id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
