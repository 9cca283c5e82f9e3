//! Executes one run from `pending` to a terminal status.

use cfactory_core::{RunKind, RunStatus};
use cfactory_db::DbError;

use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::steps;

/// What a kind-specific step left for the runner to do.
#[derive(Debug)]
pub(crate) enum StepOutcome {
    /// The runner should complete the run with these stats.
    Completed(serde_json::Value),
    /// The step already completed the run inside its own transaction.
    Finalized,
}

/// Executes the run with id `run_id`.
///
/// Returns the terminal status the run reached. Job-level failures (bad
/// config, upstream outage, missing content item) are recorded on the run
/// and reported as `Ok(RunStatus::Failed)`.
///
/// # Errors
///
/// Returns [`PipelineError::NotFound`] if the run does not exist, and
/// [`PipelineError::Persistence`] if the ledger itself cannot be written.
/// In the latter case a best-effort failure write has already been tried.
pub async fn execute_run(ctx: &PipelineContext, run_id: i64) -> Result<RunStatus, PipelineError> {
    let run = cfactory_db::get_run(&ctx.pool, run_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound => PipelineError::NotFound(format!("run {run_id}")),
            other => PipelineError::Persistence(other),
        })?;

    let kind = match run.kind.parse::<RunKind>() {
        Ok(kind) => kind,
        Err(e) => {
            tracing::warn!(run_id, kind = %run.kind, "rejecting run with unknown kind");
            fail_run_best_effort(ctx, run_id, &e.to_string()).await;
            return Ok(RunStatus::Failed);
        }
    };

    cfactory_db::mark_run_running(&ctx.pool, run_id).await?;
    tracing::info!(run_id, kind = %kind, "run started");

    let outcome = match kind {
        RunKind::Discovery => steps::discovery::run(ctx, &run.config).await,
        RunKind::Harvest => steps::harvest::run(ctx, &run.config).await,
        RunKind::Scoring => steps::scoring::run(ctx, &run.config).await,
        RunKind::Generation => steps::generation::run(ctx, run_id, &run.config).await,
    };

    let result = match outcome {
        Ok(StepOutcome::Completed(stats)) => {
            cfactory_db::mark_run_completed(&ctx.pool, run_id, &stats)
                .await
                .map_err(PipelineError::from)
        }
        Ok(StepOutcome::Finalized) => Ok(()),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            tracing::info!(run_id, kind = %kind, "run completed");
            Ok(RunStatus::Completed)
        }
        Err(e) => {
            tracing::error!(run_id, kind = %kind, error = %e, "run failed");
            fail_run_best_effort(ctx, run_id, &e.to_string()).await;
            if e.is_job_failure() {
                Ok(RunStatus::Failed)
            } else {
                Err(e)
            }
        }
    }
}

/// Marks the run failed, logging rather than returning a secondary error.
pub(crate) async fn fail_run_best_effort(ctx: &PipelineContext, run_id: i64, message: &str) {
    if let Err(mark_err) = cfactory_db::mark_run_failed(&ctx.pool, run_id, message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark run as failed"
        );
    }
}
