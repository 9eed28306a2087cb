use std::io;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream;

use crate::application::ports::{
    JobQueue, JobRepository, QueueError, RepositoryError, StagingStore, StagingStoreError,
};
use crate::domain::{AnalysisQuery, FailureKind, Job, JobId, JobOutcome, StoragePath};
use crate::infrastructure::observability::sanitize_prompt;

/// A document received from a client, fully buffered.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub data: Bytes,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

/// Limits applied before an upload is accepted. An empty
/// `allowed_content_types` accepts any declared type.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl UploadPolicy {
    fn check(&self, upload: &DocumentUpload) -> Result<(), SubmissionError> {
        if upload.data.is_empty() {
            return Err(SubmissionError::EmptyDocument);
        }

        let size = upload.data.len() as u64;
        if size > self.max_bytes {
            return Err(SubmissionError::DocumentTooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        if let Some(declared) = upload.content_type.as_deref() {
            let essence = declared
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            let allowed = self.allowed_content_types.is_empty()
                || self
                    .allowed_content_types
                    .iter()
                    .any(|ct| ct.eq_ignore_ascii_case(&essence));
            if !allowed {
                return Err(SubmissionError::UnsupportedContentType(declared.to_string()));
            }
        }

        Ok(())
    }
}

pub struct SubmissionService {
    staging_store: Arc<dyn StagingStore>,
    job_repository: Arc<dyn JobRepository>,
    job_queue: Arc<dyn JobQueue>,
    policy: UploadPolicy,
}

impl SubmissionService {
    pub fn new(
        staging_store: Arc<dyn StagingStore>,
        job_repository: Arc<dyn JobRepository>,
        job_queue: Arc<dyn JobQueue>,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            staging_store,
            job_repository,
            job_queue,
            policy,
        }
    }

    /// Stages the document, records a `PENDING` job and enqueues it, in that
    /// order. Returns as soon as the id is queued.
    #[tracing::instrument(
        skip(self, upload, query),
        fields(bytes = upload.data.len(), filename = ?upload.filename)
    )]
    pub async fn submit(
        &self,
        upload: DocumentUpload,
        query: Option<&str>,
    ) -> Result<JobId, SubmissionError> {
        self.policy.check(&upload)?;

        let query = AnalysisQuery::new(query);
        let path = StoragePath::for_upload();
        let content_length = upload.data.len() as u64;
        let body = Box::pin(stream::once(async move { Ok::<_, io::Error>(upload.data) }));

        let written = self
            .staging_store
            .store(&path, body, Some(content_length))
            .await
            .map_err(SubmissionError::Storage)?;
        tracing::debug!(path = %path, written, "Document staged");

        let job = Job::new(query, path);
        let job_id = job.id;

        if let Err(e) = self.job_repository.create(&job).await {
            if let Err(del_err) = self.staging_store.delete(&job.document_path).await {
                tracing::warn!(
                    error = %del_err,
                    path = %job.document_path,
                    "Failed to remove staged document after job creation failure"
                );
            }
            return Err(SubmissionError::Repository(e));
        }

        if let Err(e) = self.job_queue.enqueue(job_id).await {
            tracing::error!(job_id = %job_id, error = %e, "Failed to enqueue analysis job");
            let outcome = JobOutcome::failed(FailureKind::QueueUnavailable, e.to_string());
            if let Err(repo_err) = self.job_repository.complete(job_id, &outcome).await {
                tracing::warn!(error = %repo_err, "Failed to record rejected job");
            }
            return Err(SubmissionError::QueueUnavailable(e));
        }

        tracing::info!(
            job_id = %job_id,
            path = %job.document_path,
            query = %sanitize_prompt(job.query.as_str()),
            default_query = job.query.is_default(),
            "Analysis job enqueued"
        );

        Ok(job_id)
    }

    pub async fn get_status(&self, job_id: JobId) -> Result<Option<Job>, SubmissionError> {
        self.job_repository
            .get_by_id(job_id)
            .await
            .map_err(SubmissionError::Repository)
    }

    pub fn queued_jobs(&self) -> usize {
        self.job_queue.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("uploaded document is empty")]
    EmptyDocument,
    #[error("uploaded document is {size} bytes, limit is {limit}")]
    DocumentTooLarge { size: u64, limit: u64 },
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
    #[error("failed to store document: {0}")]
    Storage(StagingStoreError),
    #[error("job store: {0}")]
    Repository(RepositoryError),
    #[error("analysis queue unavailable: {0}")]
    QueueUnavailable(QueueError),
}
