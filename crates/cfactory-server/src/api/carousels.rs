//! Finished carousels and their download links.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use cfactory_db::CarouselListRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CarouselsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct CarouselItem {
    id: i64,
    plan_id: i64,
    source_id: i64,
    title: String,
    theme: String,
    object_key: String,
    slide_count: i32,
    status: String,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<CarouselListRow> for CarouselItem {
    fn from(row: CarouselListRow) -> Self {
        Self {
            id: row.id,
            plan_id: row.plan_id,
            source_id: row.source_id,
            title: row.title,
            theme: row.theme,
            object_key: row.object_key,
            slide_count: row.slide_count,
            status: row.status,
            published_at: row.published_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct DownloadLink {
    url: String,
    expires_in_secs: u64,
}

pub(super) async fn list_carousels(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CarouselsQuery>,
) -> Result<Json<ApiResponse<Vec<CarouselItem>>>, ApiError> {
    let rows = cfactory_db::list_carousels(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(CarouselItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/carousels/{id}/download: a presigned link to the archive.
pub(super) async fn download_carousel(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DownloadLink>>, ApiError> {
    let carousel = cfactory_db::get_carousel(&state.pool, id)
        .await
        .map_err(|e| match e {
            cfactory_db::DbError::NotFound => ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("carousel {id} not found"),
            ),
            other => map_db_error(req_id.0.clone(), &other),
        })?;

    let url = state
        .store
        .presigned_url(&carousel.object_key, state.download_ttl)
        .await
        .map_err(|e| {
            tracing::error!(carousel_id = id, error = %e, "failed to presign download");
            ApiError::new(req_id.0.clone(), "upstream_error", "could not create download link")
        })?;

    Ok(Json(ApiResponse {
        data: DownloadLink {
            url,
            expires_in_secs: state.download_ttl.as_secs(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
