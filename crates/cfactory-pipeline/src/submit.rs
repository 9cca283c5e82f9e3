//! Run submission: the entry points the API, CLI, and scheduler share.

use cfactory_core::{RunKind, TriggerSource};
use cfactory_db::{DbError, RunRow};
use serde_json::json;
use sqlx::PgPool;

use crate::error::PipelineError;

/// Records a run and enqueues its job in one transaction.
///
/// An unrecognised `kind` is still recorded, as a failed run with no job,
/// so the rejected request stays visible in the ledger.
///
/// # Errors
///
/// Returns [`PipelineError::Validation`] for an unknown kind, or
/// [`PipelineError::Persistence`] if the ledger write fails.
pub async fn submit_run(
    pool: &PgPool,
    kind: &str,
    config: &serde_json::Value,
    trigger: TriggerSource,
) -> Result<RunRow, PipelineError> {
    if let Err(e) = kind.parse::<RunKind>() {
        let run = cfactory_db::create_run(pool, kind, config, trigger.as_str()).await?;
        cfactory_db::mark_run_failed(pool, run.id, &e.to_string()).await?;
        tracing::warn!(run_id = run.id, kind, "rejected run with unknown kind");
        return Err(PipelineError::Validation(e.to_string()));
    }

    let (run, job) =
        cfactory_db::create_run_with_job(pool, kind, config, trigger.as_str()).await?;
    tracing::info!(
        run_id = run.id,
        job_id = job.id,
        kind,
        trigger = trigger.as_str(),
        "run queued"
    );
    Ok(run)
}

/// Approves a content item and queues a generation run for it.
///
/// The status change, the run, and its job are written in one transaction,
/// so a rejected approval leaves nothing queued. `theme` defaults to the dark
/// palette when absent.
///
/// # Errors
///
/// Returns [`PipelineError::NotFound`] if the item does not exist,
/// [`PipelineError::Conflict`] if it is completed, archived, or being
/// scored, or [`PipelineError::Persistence`] on a ledger failure.
pub async fn approve_content(
    pool: &PgPool,
    content_id: i64,
    theme: Option<&str>,
    trigger: TriggerSource,
) -> Result<RunRow, PipelineError> {
    let config = json!({
        "content_id": content_id,
        "theme": theme.unwrap_or("dark"),
    });

    let (_, run, job) =
        cfactory_db::approve_and_enqueue(pool, content_id, &config, trigger.as_str())
            .await
            .map_err(|e| match e {
                DbError::NotFound => {
                    PipelineError::NotFound(format!("content item {content_id}"))
                }
                DbError::InvalidContentTransition { id, expected_status } => {
                    PipelineError::Conflict(format!(
                        "content item {id} cannot be approved; expected {expected_status}"
                    ))
                }
                other => PipelineError::Persistence(other),
            })?;

    tracing::info!(
        run_id = run.id,
        job_id = job.id,
        content_id,
        trigger = trigger.as_str(),
        "content approved; generation queued"
    );
    Ok(run)
}
