use cfactory_db::DbError;
use cfactory_renderer::RenderError;
use cfactory_scraper::ApifyError;
use cfactory_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("render failure: {0}")]
    Render(#[from] RenderError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] DbError),
}

impl From<ApifyError> for PipelineError {
    fn from(e: ApifyError) -> Self {
        PipelineError::Upstream(format!("apify: {e}"))
    }
}

impl From<StorageError> for PipelineError {
    fn from(e: StorageError) -> Self {
        PipelineError::Upstream(format!("object storage: {e}"))
    }
}

impl PipelineError {
    /// `true` when the failure belongs to the job (bad input, upstream
    /// outage, missing item) rather than to the ledger itself.
    ///
    /// A job failure is fully recorded on the run; a persistence failure may
    /// not have been, so callers propagate it.
    #[must_use]
    pub fn is_job_failure(&self) -> bool {
        !matches!(self, PipelineError::Persistence(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_persistence_errors_escape_the_run() {
        assert!(PipelineError::Upstream("x".into()).is_job_failure());
        assert!(PipelineError::Validation("x".into()).is_job_failure());
        assert!(PipelineError::NotFound("x".into()).is_job_failure());
        assert!(PipelineError::Render(RenderError::EmptyPlan).is_job_failure());
        assert!(!PipelineError::Persistence(DbError::NotFound).is_job_failure());
    }

    #[test]
    fn adapter_errors_become_upstream_failures() {
        let err = PipelineError::from(ApifyError::Api {
            status: 402,
            message: "quota exceeded".to_string(),
        });
        assert!(matches!(err, PipelineError::Upstream(ref m) if m.contains("quota exceeded")));

        let err = PipelineError::from(StorageError::MissingCredentials("CFACTORY_S3_ACCESS_KEY"));
        assert!(matches!(err, PipelineError::Upstream(ref m) if m.contains("CFACTORY_S3_ACCESS_KEY")));
    }
}
