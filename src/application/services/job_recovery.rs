use std::sync::Arc;

use crate::application::ports::{JobQueue, JobRepository, QueueError, RepositoryError};
use crate::domain::{FailureKind, JobOutcome, JobStatus};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryReport {
    pub requeued: usize,
    pub interrupted: usize,
}

/// Run once at startup, before the workers. `PENDING` jobs left by a previous
/// process are queued again; `STARTED` ones lost their worker and are failed.
pub async fn recover_jobs(
    job_repository: &Arc<dyn JobRepository>,
    job_queue: &Arc<dyn JobQueue>,
) -> Result<RecoveryReport, RecoveryError> {
    let mut report = RecoveryReport::default();

    let interrupted = job_repository.list_by_status(JobStatus::Started).await?;
    for job in interrupted {
        let outcome = JobOutcome::failed(
            FailureKind::Interrupted,
            "analysis was interrupted by a service restart",
        );
        job_repository.complete(job.id, &outcome).await?;
        report.interrupted += 1;
    }

    let mut pending = job_repository.list_by_status(JobStatus::Pending).await?;
    pending.sort_by_key(|job| job.created_at);
    for job in pending {
        job_queue.enqueue(job.id).await?;
        report.requeued += 1;
    }

    if report != RecoveryReport::default() {
        tracing::info!(
            requeued = report.requeued,
            interrupted = report.interrupted,
            "Recovered jobs from previous run"
        );
    }

    Ok(report)
}

#[derive(Debug, thiserror::Error)]
pub enum RecoveryError {
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("queue: {0}")]
    Queue(#[from] QueueError),
}
