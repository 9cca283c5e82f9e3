//! Harvested content: review queue, approval, archiving.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use cfactory_core::{ContentStatus, TriggerSource};
use cfactory_db::ContentItemRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::runs::RunQueued;
use super::{
    map_db_error, map_pipeline_error, normalize_limit, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct ContentQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ApproveRequest {
    pub theme: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ContentItem {
    id: i64,
    url: String,
    platform: String,
    caption: Option<String>,
    metadata: serde_json::Value,
    status: String,
    score: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ContentItemRow> for ContentItem {
    fn from(row: ContentItemRow) -> Self {
        Self {
            id: row.id,
            url: row.url,
            platform: row.platform,
            caption: row.caption,
            metadata: row.metadata,
            status: public_status(row.status),
            score: row.score,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn public_status(status: String) -> String {
    match status.parse::<ContentStatus>() {
        Ok(parsed) => parsed.public().as_str().to_string(),
        Err(_) => status,
    }
}

/// GET /api/v1/content: highest score first, unscored last.
///
/// `scoring` is not a filter clients can use; claimed items list as pending.
pub(super) async fn list_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<ApiResponse<Vec<ContentItem>>>, ApiError> {
    if let Some(status) = query.status.as_deref() {
        let listable = status
            .parse::<ContentStatus>()
            .is_ok_and(|parsed| parsed.public() == parsed);
        if !listable {
            return Err(ApiError::new(
                req_id.0.clone(),
                "validation_error",
                format!("unknown content status '{status}'"),
            ));
        }
    }

    let rows = cfactory_db::list_content_items(
        &state.pool,
        query.status.as_deref(),
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ContentItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/content/{id}/approve: approve and queue generation.
///
/// The body is optional; `{"theme": "light"}` picks the light palette.
pub(super) async fn approve_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<RunQueued>>), ApiError> {
    let request: ApproveRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ApproveRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                format!("invalid approve body: {e}"),
            )
        })?
    };

    let run = cfactory_pipeline::approve_content(
        &state.pool,
        id,
        request.theme.as_deref(),
        TriggerSource::Api,
    )
    .await
    .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: RunQueued::for_run(&run),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// POST /api/v1/content/{id}/archive: drop an item from the working queue.
pub(super) async fn archive_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ContentItem>>, ApiError> {
    let row = cfactory_db::archive_content_item(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ContentItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}
