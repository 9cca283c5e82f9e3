//! Run submission and the run ledger.
//!
//! - `POST /api/v1/runs`          : queue a run of any kind
//! - `GET  /api/v1/runs`          : most recent runs first
//! - `GET  /api/v1/runs/{run_id}` : one run by its public id

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use cfactory_core::TriggerSource;
use cfactory_db::{DbError, RunRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    json_body, map_db_error, map_pipeline_error, normalize_limit, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct SubmitRunRequest {
    pub kind: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(super) struct RunsQuery {
    pub limit: Option<i64>,
}

/// Acknowledgement for a queued run.
#[derive(Debug, Serialize)]
pub(super) struct RunQueued {
    pub status: &'static str,
    pub run_id: Uuid,
}

impl RunQueued {
    pub(super) fn for_run(run: &RunRow) -> Self {
        Self {
            status: "queued",
            run_id: run.public_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct RunItem {
    run_id: Uuid,
    kind: String,
    status: String,
    trigger_source: String,
    config: serde_json::Value,
    stats: Option<serde_json::Value>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl From<RunRow> for RunItem {
    fn from(row: RunRow) -> Self {
        Self {
            run_id: row.public_id,
            kind: row.kind,
            status: row.status,
            trigger_source: row.trigger_source,
            config: row.config,
            stats: row.stats,
            error_message: row.error_message,
            created_at: row.created_at,
            started_at: row.started_at,
            finished_at: row.finished_at,
        }
    }
}

/// POST /api/v1/runs: record a run and queue it for a worker.
///
/// An unknown kind is answered with 400; the rejected run stays in the
/// ledger as failed.
pub(super) async fn submit_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<SubmitRunRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<RunQueued>>), ApiError> {
    let body = json_body(&req_id.0, payload)?;
    let config = if body.config.is_null() {
        serde_json::json!({})
    } else {
        body.config
    };
    if !config.is_object() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "config must be a JSON object",
        ));
    }

    let run = cfactory_pipeline::submit_run(&state.pool, &body.kind, &config, TriggerSource::Api)
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

pub(super) async fn list_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<ApiResponse<Vec<RunItem>>>, ApiError> {
    let rows = cfactory_db::list_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(RunItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<ApiResponse<RunItem>>, ApiError> {
    let row = cfactory_db::get_run_by_public_id(&state.pool, run_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => {
                ApiError::new(req_id.0.clone(), "not_found", format!("run {run_id} not found"))
            }
            other => map_db_error(req_id.0.clone(), &other),
        })?;

    Ok(Json(ApiResponse {
        data: RunItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_item_exposes_public_id_only() {
        let public_id = Uuid::new_v4();
        let item = RunItem::from(RunRow {
            id: 17,
            public_id,
            kind: "scoring".to_string(),
            status: "completed".to_string(),
            config: serde_json::json!({ "batch_size": 5 }),
            stats: Some(serde_json::json!({ "scored": 5, "claimed": 5 })),
            error_message: None,
            trigger_source: "api".to_string(),
            created_at: Utc::now(),
            started_at: Some(Utc::now()),
            finished_at: Some(Utc::now()),
        });

        let json = serde_json::to_value(&item).expect("serialize run item");
        assert_eq!(json["run_id"], public_id.to_string());
        assert_eq!(json["stats"]["scored"], 5);
        assert!(json.get("id").is_none());
    }

    #[test]
    fn submit_request_config_defaults_to_null() {
        let body: SubmitRunRequest =
            serde_json::from_str(r#"{"kind":"harvest"}"#).expect("parse");
        assert_eq!(body.kind, "harvest");
        assert!(body.config.is_null());
    }
}
