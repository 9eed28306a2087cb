use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::application::ports::{
    AnalysisEngine, AnalysisRequest, JobQueue, JobRepository, RepositoryError, StagingStore,
};
use crate::domain::{FailureKind, JobId, JobOutcome, JobStatus, StoragePath};

#[derive(Debug, Clone, Default)]
pub struct WorkerOptions {
    /// Upper bound on one engine call. `None` lets a call run forever.
    pub engine_timeout: Option<Duration>,
    pub delete_document_after_processing: bool,
}

pub struct AnalysisWorker {
    worker_id: usize,
    job_queue: Arc<dyn JobQueue>,
    job_repository: Arc<dyn JobRepository>,
    engine: Arc<dyn AnalysisEngine>,
    staging_store: Arc<dyn StagingStore>,
    options: WorkerOptions,
    shutdown: CancellationToken,
}

impl AnalysisWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        worker_id: usize,
        job_queue: Arc<dyn JobQueue>,
        job_repository: Arc<dyn JobRepository>,
        engine: Arc<dyn AnalysisEngine>,
        staging_store: Arc<dyn StagingStore>,
        options: WorkerOptions,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            worker_id,
            job_queue,
            job_repository,
            engine,
            staging_store,
            options,
            shutdown,
        }
    }

    /// Processes jobs one at a time until shutdown or until the queue is
    /// closed and drained. A job already being analyzed is finished first.
    pub async fn run(self) {
        tracing::info!(worker_id = self.worker_id, "Analysis worker started");
        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                next = self.job_queue.dequeue() => next,
            };
            let Some(job_id) = next else {
                break;
            };

            let span = tracing::info_span!(
                "analysis_job",
                job_id = %job_id,
                worker_id = self.worker_id,
            );
            if let Err(e) = self.process_job(job_id).instrument(span).await {
                tracing::error!(job_id = %job_id, error = %e, "Analysis job bookkeeping failed");
            }
        }
        tracing::info!(worker_id = self.worker_id, "Analysis worker stopped");
    }

    pub async fn process_job(&self, job_id: JobId) -> Result<(), AnalysisWorkerError> {
        let Some(job) = self.job_repository.claim(job_id).await? else {
            tracing::debug!("Job already claimed or no longer available, skipping");
            return Ok(());
        };
        tracing::debug!(status = %JobStatus::Started, "Job status transition");

        let request = AnalysisRequest {
            query: job.query.clone(),
            document_path: job.document_path.clone(),
        };
        let outcome = self.run_engine(&request).await;

        match &outcome {
            JobOutcome::Succeeded(text) => {
                tracing::info!(result_chars = text.len(), "Analysis completed");
            }
            JobOutcome::Failed(failure) => {
                tracing::warn!(kind = %failure.kind, error = %failure.message, "Analysis failed");
            }
        }

        self.job_repository.complete(job_id, &outcome).await?;

        if self.options.delete_document_after_processing {
            self.discard_document(&job.document_path).await;
        }

        Ok(())
    }

    async fn run_engine(&self, request: &AnalysisRequest) -> JobOutcome {
        let analysis = AssertUnwindSafe(self.engine.analyze(request)).catch_unwind();

        let result = match self.options.engine_timeout {
            Some(limit) => match tokio::time::timeout(limit, analysis).await {
                Ok(result) => result,
                Err(_) => {
                    return JobOutcome::failed(
                        FailureKind::Timeout,
                        format!("analysis timed out after {}s", limit.as_secs()),
                    );
                }
            },
            None => analysis.await,
        };

        match result {
            Ok(Ok(text)) => JobOutcome::Succeeded(text),
            Ok(Err(e)) => JobOutcome::failed(FailureKind::Engine, e.to_string()),
            Err(panic) => JobOutcome::failed(FailureKind::Panicked, panic_message(panic.as_ref())),
        }
    }

    async fn discard_document(&self, path: &StoragePath) {
        if let Err(e) = self.staging_store.delete(path).await {
            tracing::warn!(error = %e, path = %path, "Failed to delete staged document");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("analysis engine panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("analysis engine panicked: {}", s)
    } else {
        "analysis engine panicked".to_string()
    }
}

/// Spawns `size` workers sharing one queue.
pub struct WorkerPool {
    size: usize,
    job_queue: Arc<dyn JobQueue>,
    job_repository: Arc<dyn JobRepository>,
    engine: Arc<dyn AnalysisEngine>,
    staging_store: Arc<dyn StagingStore>,
    options: WorkerOptions,
}

impl WorkerPool {
    pub fn new(
        size: usize,
        job_queue: Arc<dyn JobQueue>,
        job_repository: Arc<dyn JobRepository>,
        engine: Arc<dyn AnalysisEngine>,
        staging_store: Arc<dyn StagingStore>,
        options: WorkerOptions,
    ) -> Self {
        Self {
            size: size.max(1),
            job_queue,
            job_repository,
            engine,
            staging_store,
            options,
        }
    }

    pub fn spawn(&self, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        tracing::info!(workers = self.size, "Spawning analysis workers");
        (0..self.size)
            .map(|worker_id| {
                let worker = AnalysisWorker::new(
                    worker_id,
                    Arc::clone(&self.job_queue),
                    Arc::clone(&self.job_repository),
                    Arc::clone(&self.engine),
                    Arc::clone(&self.staging_store),
                    self.options.clone(),
                    shutdown.clone(),
                );
                tokio::spawn(worker.run())
            })
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisWorkerError {
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}
