use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Job, JobId, JobOutcome, JobStatus};

use super::RepositoryError;

/// Result store: job id to status and result, with a fixed retention window
/// after completion.
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &Job) -> Result<(), RepositoryError>;

    /// Returns `None` for unknown ids and for jobs whose retention elapsed.
    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;

    /// Atomically moves a `PENDING` job to `STARTED`. Returns `None` when the
    /// job is missing or already claimed.
    async fn claim(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;

    async fn complete(&self, id: JobId, outcome: &JobOutcome) -> Result<(), RepositoryError>;

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>, RepositoryError>;

    /// Deletes jobs whose retention elapsed at `now`; returns how many.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;
}
