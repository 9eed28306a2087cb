use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{JobRepository, RepositoryError};
use crate::domain::{
    AnalysisQuery, FailureKind, Job, JobFailure, JobId, JobOutcome, JobStatus, StoragePath,
};

const JOB_COLUMNS: &str = "id, query, document_path, status, result, failure_kind, \
     failure_message, created_at, started_at, completed_at";

/// Durable result store on the `analysis_jobs` table.
pub struct PgJobRepository {
    pool: PgPool,
    retention: Duration,
}

impl PgJobRepository {
    pub fn new(pool: PgPool, retention: Duration) -> Self {
        Self { pool, retention }
    }

    /// `None` when the window reaches past the representable range, in which
    /// case nothing has expired yet.
    fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        now.checked_sub_signed(self.retention)
    }
}

fn job_from_row(row: &PgRow) -> Result<Job, RepositoryError> {
    let get_err = |e: sqlx::Error| RepositoryError::CorruptRecord(e.to_string());

    let status: String = row.try_get("status").map_err(get_err)?;
    let status = status
        .parse::<JobStatus>()
        .map_err(RepositoryError::CorruptRecord)?;

    let failure_kind: Option<String> = row.try_get("failure_kind").map_err(get_err)?;
    let failure_message: Option<String> = row.try_get("failure_message").map_err(get_err)?;
    let failure = match failure_kind {
        Some(kind) => Some(JobFailure::new(
            kind.parse::<FailureKind>()
                .map_err(RepositoryError::CorruptRecord)?,
            failure_message.unwrap_or_default(),
        )),
        None => None,
    };

    let id: Uuid = row.try_get("id").map_err(get_err)?;
    let query: String = row.try_get("query").map_err(get_err)?;
    let document_path: String = row.try_get("document_path").map_err(get_err)?;

    Ok(Job {
        id: JobId::from_uuid(id),
        query: AnalysisQuery::from_raw(query),
        document_path: StoragePath::from_raw(document_path),
        status,
        result: row.try_get("result").map_err(get_err)?,
        failure,
        created_at: row.try_get("created_at").map_err(get_err)?,
        started_at: row.try_get("started_at").map_err(get_err)?,
        completed_at: row.try_get("completed_at").map_err(get_err)?,
    })
}

#[async_trait]
impl JobRepository for PgJobRepository {
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    async fn create(&self, job: &Job) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO analysis_jobs (id, query, document_path, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(job.id.as_uuid())
        .bind(job.query.as_str())
        .bind(job.document_path.as_str())
        .bind(job.status.as_str())
        .bind(job.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM analysis_jobs \
             WHERE id = $1 AND (completed_at IS NULL OR $2::timestamptz IS NULL OR completed_at > $2)"
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(self.cutoff(Utc::now()))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.as_ref().map(job_from_row).transpose()
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn claim(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let sql = format!(
            "UPDATE analysis_jobs SET status = $1, started_at = $2 \
             WHERE id = $3 AND status = $4 \
             RETURNING {JOB_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(JobStatus::Started.as_str())
            .bind(Utc::now())
            .bind(id.as_uuid())
            .bind(JobStatus::Pending.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.as_ref().map(job_from_row).transpose()
    }

    #[instrument(skip(self, outcome), fields(job_id = %id, success = outcome.is_success()))]
    async fn complete(&self, id: JobId, outcome: &JobOutcome) -> Result<(), RepositoryError> {
        let (status, result, kind, message) = match outcome {
            JobOutcome::Succeeded(text) => (JobStatus::Success, text.clone(), None, None),
            JobOutcome::Failed(failure) => (
                JobStatus::Failure,
                failure.render(),
                Some(failure.kind.as_str()),
                Some(failure.message.as_str()),
            ),
        };

        let updated = sqlx::query(
            r#"
            UPDATE analysis_jobs
            SET status = $1, result = $2, failure_kind = $3, failure_message = $4, completed_at = $5
            WHERE id = $6
            "#,
        )
        .bind(status.as_str())
        .bind(result)
        .bind(kind)
        .bind(message)
        .bind(Utc::now())
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(status = %status))]
    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>, RepositoryError> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM analysis_jobs \
             WHERE status = $1 AND (completed_at IS NULL OR $2::timestamptz IS NULL OR completed_at > $2) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(status.as_str())
            .bind(self.cutoff(Utc::now()))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(job_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let Some(cutoff) = self.cutoff(now) else {
            return Ok(0);
        };
        let deleted = sqlx::query(
            "DELETE FROM analysis_jobs WHERE completed_at IS NOT NULL AND completed_at <= $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(deleted.rows_affected())
    }
}
