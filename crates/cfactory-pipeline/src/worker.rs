//! Polls the `run_jobs` queue and executes claimed runs.
//!
//! Each worker claims at most as many jobs as it has free permits, so a job
//! is only ever claimed when it can start immediately. Claims use
//! `FOR UPDATE SKIP LOCKED`; any number of workers may share one database.

use std::sync::Arc;
use std::time::Duration;

use cfactory_core::{AppConfig, RunStatus};
use cfactory_db::JobRow;
use rand::Rng;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::runner::execute_run;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub worker_id: String,
    pub concurrency: usize,
    pub poll_interval: Duration,
}

impl WorkerConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            worker_id: format!("worker-{}", uuid::Uuid::new_v4()),
            concurrency: config.worker_concurrency.max(1),
            poll_interval: Duration::from_millis(config.worker_poll_interval_ms),
        }
    }
}

pub struct Worker {
    ctx: Arc<PipelineContext>,
    config: WorkerConfig,
}

impl Worker {
    #[must_use]
    pub fn new(ctx: Arc<PipelineContext>, config: WorkerConfig) -> Self {
        Self { ctx, config }
    }

    #[must_use]
    pub fn worker_id(&self) -> &str {
        &self.config.worker_id
    }

    /// Polls until `shutdown` turns `true` or its sender is dropped, then
    /// waits for in-flight jobs before returning.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut in_flight = JoinSet::new();

        tracing::info!(
            worker_id = %self.config.worker_id,
            concurrency = self.config.concurrency,
            "worker started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            while let Some(joined) = in_flight.try_join_next() {
                log_join_result(joined);
            }

            let available = semaphore.available_permits();
            if available > 0 {
                match self.claim(available).await {
                    Ok(jobs) => {
                        for job in jobs {
                            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                                break;
                            };
                            let ctx = Arc::clone(&self.ctx);
                            in_flight.spawn(async move {
                                process_job(&ctx, job).await;
                                drop(permit);
                            });
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "failed to claim jobs"),
                }
            }

            tokio::select! {
                () = tokio::time::sleep(jittered(self.config.poll_interval)) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!(in_flight = in_flight.len(), "worker draining");
        while let Some(joined) = in_flight.join_next().await {
            log_join_result(joined);
        }
        tracing::info!(worker_id = %self.config.worker_id, "worker stopped");
    }

    /// Claims one batch (up to the concurrency limit), executes it, and
    /// returns how many jobs were processed.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Persistence`] if the claim query fails.
    pub async fn run_once(&self) -> Result<usize, PipelineError> {
        let jobs = self.claim(self.config.concurrency).await?;
        let count = jobs.len();

        let mut batch = JoinSet::new();
        for job in jobs {
            let ctx = Arc::clone(&self.ctx);
            batch.spawn(async move { process_job(&ctx, job).await });
        }
        while let Some(joined) = batch.join_next().await {
            log_join_result(joined);
        }
        Ok(count)
    }

    async fn claim(&self, limit: usize) -> Result<Vec<JobRow>, PipelineError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let jobs = cfactory_db::claim_jobs(&self.ctx.pool, &self.config.worker_id, limit).await?;
        if !jobs.is_empty() {
            tracing::debug!(
                worker_id = %self.config.worker_id,
                claimed = jobs.len(),
                "claimed jobs"
            );
        }
        Ok(jobs)
    }
}

async fn process_job(ctx: &PipelineContext, job: JobRow) {
    let outcome = execute_run(ctx, job.run_id).await;

    let recorded = match outcome {
        Ok(RunStatus::Completed) => cfactory_db::complete_job(&ctx.pool, job.id).await,
        Ok(status) => {
            let message = format!("run {} finished {status}", job.run_id);
            cfactory_db::fail_job(&ctx.pool, job.id, &message).await
        }
        Err(e) => {
            tracing::error!(job_id = job.id, run_id = job.run_id, error = %e, "job errored");
            cfactory_db::fail_job(&ctx.pool, job.id, &e.to_string()).await
        }
    };

    if let Err(e) = recorded {
        tracing::error!(job_id = job.id, error = %e, "failed to record job outcome");
    }
}

fn log_join_result(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "job task panicked");
    }
}

/// Spreads polls by ±25% so idle workers do not hit the database in step.
fn jittered(base: Duration) -> Duration {
    let factor: f64 = rand::rng().random_range(0.75..=1.25);
    base.mul_f64(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_within_a_quarter() {
        let base = Duration::from_millis(1000);
        for _ in 0..200 {
            let d = jittered(base);
            assert!(d >= Duration::from_millis(750), "{d:?}");
            assert!(d <= Duration::from_millis(1250), "{d:?}");
        }
    }
}
