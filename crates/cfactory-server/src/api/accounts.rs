//! Source account management.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use cfactory_db::{AccountRow, NewAccount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    json_body, map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta,
};

const DEFAULT_PLATFORM: &str = "instagram";
const MAX_USERNAME_LEN: usize = 100;

#[derive(Debug, Deserialize)]
pub(super) struct AccountsQuery {
    pub active: Option<bool>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateAccountRequest {
    pub platform: Option<String>,
    pub username: String,
    pub category: Option<String>,
    pub followers: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(super) struct AccountItem {
    id: i64,
    platform: String,
    username: String,
    followers: Option<i32>,
    category: Option<String>,
    is_active: bool,
    last_harvested_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for AccountItem {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            platform: row.platform,
            username: row.username,
            followers: row.followers,
            category: row.category,
            is_active: row.is_active,
            last_harvested_at: row.last_harvested_at,
            created_at: row.created_at,
        }
    }
}

/// Strips a leading `@` and surrounding whitespace.
fn normalize_username(raw: &str) -> &str {
    raw.trim().trim_start_matches('@')
}

pub(super) async fn list_accounts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<AccountsQuery>,
) -> Result<Json<ApiResponse<Vec<AccountItem>>>, ApiError> {
    let rows = cfactory_db::list_accounts(&state.pool, query.active, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(AccountItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/accounts: add (or reactivate) a tracked account.
pub(super) async fn create_account(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AccountItem>>), ApiError> {
    let rid = &req_id.0;
    let body = json_body(rid, payload)?;
    let username = normalize_username(&body.username);
    if username.is_empty() || username.len() > MAX_USERNAME_LEN {
        return Err(ApiError::new(
            rid.clone(),
            "validation_error",
            format!("username must be 1-{MAX_USERNAME_LEN} characters"),
        ));
    }
    if body.followers.is_some_and(|n| n < 0) {
        return Err(ApiError::new(
            rid.clone(),
            "validation_error",
            "followers must not be negative",
        ));
    }
    let platform = body
        .platform
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PLATFORM);

    let row = cfactory_db::upsert_account(
        &state.pool,
        &NewAccount {
            platform,
            username,
            followers: body.followers,
            category: body.category.as_deref(),
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    tracing::info!(account_id = row.id, platform, username, "account saved");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: AccountItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// DELETE /api/v1/accounts/{id}: stop harvesting an account.
pub(super) async fn deactivate_account(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    cfactory_db::deactivate_account(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "id": id, "deactivated": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
