//! Background job scheduler.
//!
//! Registers the recurring maintenance jobs: the recovery sweep for runs whose
//! worker died, and a queue heartbeat that logs queue depth.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Every five minutes, on the minute.
const RECOVERY_SCHEDULE: &str = "0 */5 * * * *";
const HEARTBEAT_SCHEDULE: &str = "0 * * * * *";

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<cfactory_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_recovery_job(
        &scheduler,
        pool.clone(),
        Duration::from_secs(config.stale_run_after_secs),
    )
    .await?;
    register_heartbeat_job(&scheduler, pool).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_recovery_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    stale_after: Duration,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(RECOVERY_SCHEDULE, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            match cfactory_pipeline::recover_interrupted(&pool, stale_after).await {
                Ok(report) if !report.is_empty() => {
                    tracing::info!(?report, "scheduler: recovery sweep settled interrupted work");
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "scheduler: recovery sweep failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

async fn register_heartbeat_job(
    scheduler: &JobScheduler,
    pool: PgPool,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(HEARTBEAT_SCHEDULE, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            match cfactory_db::count_jobs_by_status(&pool).await {
                Ok(depth) => tracing::info!(
                    queued = depth.queued,
                    claimed = depth.claimed,
                    "scheduler: queue heartbeat"
                ),
                Err(e) => tracing::warn!(error = %e, "scheduler: queue heartbeat failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schedules_are_valid_cron_expressions() {
        for schedule in [RECOVERY_SCHEDULE, HEARTBEAT_SCHEDULE] {
            let job = Job::new_async(schedule, |_uuid, _lock| Box::pin(async {}));
            assert!(job.is_ok(), "invalid schedule: {schedule}");
        }
    }
}
