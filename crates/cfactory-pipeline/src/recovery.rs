//! Settles work left behind by a worker that died mid-run.
//!
//! Nothing is retried; an interrupted run is failed and the caller submits a
//! new one if it still wants the work done.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::PipelineError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    pub failed_runs: Vec<i64>,
    pub failed_jobs: u64,
    pub deleted_plans: u64,
    pub released_items: u64,
}

impl RecoveryReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failed_runs.is_empty()
            && self.failed_jobs == 0
            && self.deleted_plans == 0
            && self.released_items == 0
    }
}

/// Fails runs with no progress for `stale_after`, deletes their orphaned
/// draft plans, fails their jobs, and releases stale scoring claims.
///
/// # Errors
///
/// Returns [`PipelineError::Persistence`] if any recovery query fails.
pub async fn recover_interrupted(
    pool: &PgPool,
    stale_after: Duration,
) -> Result<RecoveryReport, PipelineError> {
    let cutoff = cutoff_for(Utc::now(), stale_after);
    let message = format!("interrupted: no progress for {}s", stale_after.as_secs());

    let failed_runs = cfactory_db::fail_stale_runs(pool, cutoff, &message).await?;
    let failed_jobs = cfactory_db::fail_jobs_for_runs(pool, &failed_runs, &message).await?;
    let deleted_plans = cfactory_db::delete_orphaned_draft_plans(pool).await?;
    let released_items = cfactory_db::release_stale_scoring_claims(pool, cutoff).await?;

    let report = RecoveryReport {
        failed_runs,
        failed_jobs,
        deleted_plans,
        released_items,
    };
    if report.is_empty() {
        tracing::debug!("recovery sweep found nothing to settle");
    } else {
        tracing::warn!(
            failed_runs = report.failed_runs.len(),
            failed_jobs = report.failed_jobs,
            deleted_plans = report.deleted_plans,
            released_items = report.released_items,
            "recovered interrupted work"
        );
    }
    Ok(report)
}

fn cutoff_for(now: DateTime<Utc>, stale_after: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(stale_after)
        .ok()
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_is_now_minus_threshold() {
        let now = Utc::now();
        let cutoff = cutoff_for(now, Duration::from_secs(1800));
        assert_eq!(now - cutoff, TimeDelta::seconds(1800));
    }

    #[test]
    fn oversized_threshold_falls_back_to_min_utc() {
        let cutoff = cutoff_for(Utc::now(), Duration::from_secs(u64::MAX));
        assert_eq!(cutoff, DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn empty_report() {
        assert!(RecoveryReport::default().is_empty());
        let report = RecoveryReport {
            released_items: 1,
            ..RecoveryReport::default()
        };
        assert!(!report.is_empty());
    }
}
