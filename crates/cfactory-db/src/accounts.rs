//! Database operations for `accounts`, the profiles targeted by harvest runs.
//!
//! Accounts are never deleted; deactivation flips `is_active`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `accounts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: i64,
    pub platform: String,
    pub username: String,
    pub followers: Option<i32>,
    pub category: Option<String>,
    pub is_active: bool,
    pub last_harvested_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccount<'a> {
    pub platform: &'a str,
    pub username: &'a str,
    pub followers: Option<i32>,
    pub category: Option<&'a str>,
}

/// Inserts an active account unless `(platform, username)` is already known.
///
/// Returns `Some(row)` when a new row was written and `None` when the
/// account already existed (its row is left untouched).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_account_if_absent(
    pool: &PgPool,
    account: &NewAccount<'_>,
) -> Result<Option<AccountRow>, DbError> {
    let row = sqlx::query_as::<_, AccountRow>(
        "INSERT INTO accounts (platform, username, followers, category, is_active) \
         VALUES ($1, $2, $3, $4, TRUE) \
         ON CONFLICT (platform, username) DO NOTHING \
         RETURNING id, platform, username, followers, category, is_active, \
                   last_harvested_at, created_at, updated_at",
    )
    .bind(account.platform)
    .bind(account.username)
    .bind(account.followers)
    .bind(account.category)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Creates an account, or reactivates and refreshes an existing one.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_account(pool: &PgPool, account: &NewAccount<'_>) -> Result<AccountRow, DbError> {
    let row = sqlx::query_as::<_, AccountRow>(
        "INSERT INTO accounts (platform, username, followers, category, is_active) \
         VALUES ($1, $2, $3, $4, TRUE) \
         ON CONFLICT (platform, username) DO UPDATE SET \
             is_active  = TRUE, \
             followers  = COALESCE(EXCLUDED.followers, accounts.followers), \
             category   = COALESCE(EXCLUDED.category, accounts.category), \
             updated_at = NOW() \
         RETURNING id, platform, username, followers, category, is_active, \
                   last_harvested_at, created_at, updated_at",
    )
    .bind(account.platform)
    .bind(account.username)
    .bind(account.followers)
    .bind(account.category)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches one account by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if absent, or [`DbError::Sqlx`] on failure.
pub async fn get_account(pool: &PgPool, id: i64) -> Result<AccountRow, DbError> {
    sqlx::query_as::<_, AccountRow>(
        "SELECT id, platform, username, followers, category, is_active, \
                last_harvested_at, created_at, updated_at \
         FROM accounts WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Lists accounts, optionally filtered by `is_active`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_accounts(
    pool: &PgPool,
    active: Option<bool>,
    limit: i64,
) -> Result<Vec<AccountRow>, DbError> {
    let rows = sqlx::query_as::<_, AccountRow>(
        "SELECT id, platform, username, followers, category, is_active, \
                last_harvested_at, created_at, updated_at \
         FROM accounts \
         WHERE ($1::BOOLEAN IS NULL OR is_active = $1) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(active)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns up to `limit` active accounts, least recently harvested first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_harvest_targets(pool: &PgPool, limit: i64) -> Result<Vec<AccountRow>, DbError> {
    let rows = sqlx::query_as::<_, AccountRow>(
        "SELECT id, platform, username, followers, category, is_active, \
                last_harvested_at, created_at, updated_at \
         FROM accounts \
         WHERE is_active \
         ORDER BY last_harvested_at NULLS FIRST, id \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Stamps `last_harvested_at = NOW()` on every listed account.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_accounts_harvested(pool: &PgPool, ids: &[i64]) -> Result<u64, DbError> {
    if ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        "UPDATE accounts SET last_harvested_at = NOW(), updated_at = NOW() \
         WHERE id = ANY($1)",
    )
    .bind(ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Soft-deletes an account.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no account has this id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn deactivate_account(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE accounts SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
