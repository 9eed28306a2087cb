use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use findoc_analyzer::application::ports::{
    AnalysisEngine, JobQueue, JobRepository, StagingStore,
};
use findoc_analyzer::application::services::{
    AnalysisWorker, DocumentUpload, SubmissionService, UploadPolicy, WorkerOptions, WorkerPool,
};
use findoc_analyzer::domain::{
    AnalysisQuery, DEFAULT_ANALYSIS_QUERY, FailureKind, Job, JobStatus, StoragePath,
};
use findoc_analyzer::infrastructure::persistence::InMemoryJobRepository;
use findoc_analyzer::infrastructure::queue::ChannelJobQueue;
use findoc_analyzer::infrastructure::storage::LocalStagingStore;

use crate::helpers::{
    BlockingEngine, PanickingEngine, ScriptedEngine, stage_document, temp_staging_store,
    wait_for_status, wait_for_terminal,
};

struct Harness {
    _dir: tempfile::TempDir,
    staging: Arc<LocalStagingStore>,
    repository: Arc<InMemoryJobRepository>,
    queue: Arc<ChannelJobQueue>,
}

impl Harness {
    fn new() -> Self {
        let (dir, staging) = temp_staging_store();
        Self {
            _dir: dir,
            staging,
            repository: Arc::new(InMemoryJobRepository::new(chrono::Duration::hours(1))),
            queue: Arc::new(ChannelJobQueue::new(64)),
        }
    }

    fn worker(&self, engine: Arc<dyn AnalysisEngine>, options: WorkerOptions) -> AnalysisWorker {
        AnalysisWorker::new(
            0,
            self.queue.clone(),
            self.repository.clone(),
            engine,
            self.staging.clone(),
            options,
            CancellationToken::new(),
        )
    }

    fn pool(&self, size: usize, engine: Arc<dyn AnalysisEngine>, options: WorkerOptions) -> WorkerPool {
        WorkerPool::new(
            size,
            self.queue.clone(),
            self.repository.clone(),
            engine,
            self.staging.clone(),
            options,
        )
    }

    fn submission_service(&self) -> SubmissionService {
        SubmissionService::new(
            self.staging.clone(),
            self.repository.clone(),
            self.queue.clone(),
            UploadPolicy {
                max_bytes: 1024 * 1024,
                allowed_content_types: Vec::new(),
            },
        )
    }

    async fn pending_job(&self, query: &str) -> Job {
        let path = stage_document(self.staging.as_ref(), "Revenue: 10M").await;
        let job = Job::new(AnalysisQuery::new(Some(query)), path);
        self.repository.create(&job).await.unwrap();
        job
    }
}

fn upload(content: &'static [u8]) -> DocumentUpload {
    DocumentUpload {
        data: Bytes::from_static(content),
        filename: Some("report.pdf".to_string()),
        content_type: Some("application/pdf".to_string()),
    }
}

#[tokio::test]
async fn given_pending_job_when_processed_then_result_is_stored_as_success() {
    let harness = Harness::new();
    let job = harness.pending_job("Summarize revenue").await;
    let worker = harness.worker(Arc::new(ScriptedEngine::new()), WorkerOptions::default());

    worker.process_job(job.id).await.unwrap();

    let stored = harness.repository.get_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Success);
    assert_eq!(stored.visible_result(), Some("analysis of Summarize revenue"));
    assert!(stored.started_at.is_some());
    assert!(stored.completed_at.is_some());
}

#[tokio::test]
async fn given_engine_error_when_processed_then_failure_text_is_recorded() {
    let harness = Harness::new();
    let job = harness.pending_job("fail: model unavailable").await;
    let worker = harness.worker(Arc::new(ScriptedEngine::new()), WorkerOptions::default());

    worker.process_job(job.id).await.unwrap();

    let stored = harness.repository.get_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failure);
    assert_eq!(
        stored.visible_result(),
        Some("Error processing financial document: model unavailable")
    );
    assert_eq!(stored.failure.map(|f| f.kind), Some(FailureKind::Engine));
}

#[tokio::test]
async fn given_failed_job_when_next_job_arrives_then_worker_still_serves_it() {
    let harness = Harness::new();
    let engine = Arc::new(ScriptedEngine::new());
    let shutdown = CancellationToken::new();
    let handles = harness
        .pool(1, engine.clone(), WorkerOptions::default())
        .spawn(shutdown.clone());

    let failing = harness.pending_job("fail: corrupt file").await;
    let healthy = harness.pending_job("Summarize revenue").await;
    harness.queue.enqueue(failing.id).await.unwrap();
    harness.queue.enqueue(healthy.id).await.unwrap();

    let failed = wait_for_terminal(harness.repository.as_ref(), failing.id).await;
    let succeeded = wait_for_terminal(harness.repository.as_ref(), healthy.id).await;

    assert_eq!(failed.status, JobStatus::Failure);
    assert_eq!(succeeded.status, JobStatus::Success);
    assert_eq!(engine.calls(), 2);

    shutdown.cancel();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn given_same_id_delivered_twice_when_workers_run_then_engine_runs_once() {
    let harness = Harness::new();
    let engine = Arc::new(ScriptedEngine::new());
    let shutdown = CancellationToken::new();
    let handles = harness
        .pool(2, engine.clone(), WorkerOptions::default())
        .spawn(shutdown.clone());

    let job = harness.pending_job("Summarize revenue").await;
    harness.queue.enqueue(job.id).await.unwrap();
    harness.queue.enqueue(job.id).await.unwrap();

    wait_for_terminal(harness.repository.as_ref(), job.id).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(engine.calls(), 1);
    assert!(harness.queue.is_empty());

    shutdown.cancel();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn given_claimed_job_when_processed_again_then_it_is_skipped() {
    let harness = Harness::new();
    let job = harness.pending_job("Summarize revenue").await;
    let engine = Arc::new(ScriptedEngine::new());
    let worker = harness.worker(engine.clone(), WorkerOptions::default());

    worker.process_job(job.id).await.unwrap();
    worker.process_job(job.id).await.unwrap();

    assert_eq!(engine.calls(), 1);
}

#[tokio::test]
async fn given_slow_engine_when_timeout_elapses_then_job_fails_with_timeout() {
    let harness = Harness::new();
    let job = harness.pending_job("Summarize revenue").await;
    let options = WorkerOptions {
        engine_timeout: Some(Duration::from_millis(50)),
        delete_document_after_processing: false,
    };
    let worker = harness.worker(Arc::new(BlockingEngine::new()), options);

    worker.process_job(job.id).await.unwrap();

    let stored = harness.repository.get_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failure);
    assert_eq!(stored.failure.map(|f| f.kind), Some(FailureKind::Timeout));
}

#[tokio::test]
async fn given_panicking_engine_when_processed_then_job_fails_and_worker_survives() {
    let harness = Harness::new();
    let job = harness.pending_job("Summarize revenue").await;
    let worker = harness.worker(Arc::new(PanickingEngine), WorkerOptions::default());

    worker.process_job(job.id).await.unwrap();

    let stored = harness.repository.get_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failure);
    let failure = stored.failure.unwrap();
    assert_eq!(failure.kind, FailureKind::Panicked);
    assert!(failure.message.contains("model exploded"));
}

#[tokio::test]
async fn given_delete_option_when_job_finishes_then_staged_document_is_removed() {
    let harness = Harness::new();
    let job = harness.pending_job("Summarize revenue").await;
    let options = WorkerOptions {
        engine_timeout: None,
        delete_document_after_processing: true,
    };
    let worker = harness.worker(Arc::new(ScriptedEngine::new()), options);

    worker.process_job(job.id).await.unwrap();

    assert!(harness.staging.fetch(&job.document_path).await.is_err());
}

#[tokio::test]
async fn given_default_options_when_job_finishes_then_staged_document_is_kept() {
    let harness = Harness::new();
    let job = harness.pending_job("Summarize revenue").await;
    let worker = harness.worker(Arc::new(ScriptedEngine::new()), WorkerOptions::default());

    worker.process_job(job.id).await.unwrap();

    assert!(harness.staging.fetch(&job.document_path).await.is_ok());
}

#[tokio::test]
async fn given_blocked_engine_when_submitting_then_submit_returns_and_status_is_not_terminal() {
    let harness = Harness::new();
    let engine = Arc::new(BlockingEngine::new());
    let shutdown = CancellationToken::new();
    let handles = harness
        .pool(1, engine.clone(), WorkerOptions::default())
        .spawn(shutdown.clone());
    let service = harness.submission_service();

    let first = tokio::time::timeout(
        Duration::from_secs(1),
        service.submit(upload(b"%PDF-1.4 one"), Some("Summarize revenue")),
    )
    .await
    .expect("submit must not wait for analysis")
    .unwrap();
    let second = service.submit(upload(b"%PDF-1.4 two"), None).await.unwrap();

    wait_for_status(harness.repository.as_ref(), first, JobStatus::Started).await;
    while engine.started.load(Ordering::SeqCst) < 1 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let running = harness.repository.get_by_id(first).await.unwrap().unwrap();
    let waiting = harness.repository.get_by_id(second).await.unwrap().unwrap();
    assert!(running.visible_result().is_none());
    assert_eq!(waiting.status, JobStatus::Pending);
    assert!(waiting.visible_result().is_none());
    assert_eq!(engine.started.load(Ordering::SeqCst), 1);

    engine.release();
    let done = wait_for_terminal(harness.repository.as_ref(), first).await;
    assert_eq!(done.status, JobStatus::Success);

    while engine.started.load(Ordering::SeqCst) < 2 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    engine.release();
    let done = wait_for_terminal(harness.repository.as_ref(), second).await;
    assert_eq!(
        done.visible_result(),
        Some(format!("released analysis of {}", DEFAULT_ANALYSIS_QUERY).as_str())
    );

    shutdown.cancel();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn given_empty_query_when_job_runs_then_engine_receives_default_prompt() {
    let harness = Harness::new();
    let engine = Arc::new(ScriptedEngine::new());
    let service = harness.submission_service();
    let worker = harness.worker(engine.clone(), WorkerOptions::default());

    let job_id = service.submit(upload(b"%PDF-1.4"), Some("")).await.unwrap();
    let delivered = harness.queue.dequeue().await.unwrap();
    worker.process_job(delivered).await.unwrap();

    let requests = engine.requests.lock().await;
    assert_eq!(delivered, job_id);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query.as_str(), DEFAULT_ANALYSIS_QUERY);
}

#[tokio::test]
async fn given_completed_job_when_polled_repeatedly_then_result_is_stable() {
    let harness = Harness::new();
    let job = harness.pending_job("Summarize revenue").await;
    let worker = harness.worker(Arc::new(ScriptedEngine::new()), WorkerOptions::default());
    worker.process_job(job.id).await.unwrap();

    let first = harness.repository.get_by_id(job.id).await.unwrap().unwrap();
    for _ in 0..5 {
        let again = harness.repository.get_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(again.status, first.status);
        assert_eq!(again.result, first.result);
    }
}

#[tokio::test]
async fn given_shutdown_signal_when_workers_idle_then_they_exit() {
    let harness = Harness::new();
    let shutdown = CancellationToken::new();
    let handles = harness
        .pool(3, Arc::new(ScriptedEngine::new()), WorkerOptions::default())
        .spawn(shutdown.clone());
    assert_eq!(handles.len(), 3);

    shutdown.cancel();

    for handle in handles {
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker should stop on shutdown")
            .unwrap();
    }
}

#[tokio::test]
async fn given_closed_and_drained_queue_when_worker_runs_then_it_exits() {
    let harness = Harness::new();
    let job = harness.pending_job("Summarize revenue").await;
    harness.queue.enqueue(job.id).await.unwrap();
    harness.queue.close().await;
    let worker = harness.worker(Arc::new(ScriptedEngine::new()), WorkerOptions::default());

    tokio::time::timeout(Duration::from_secs(1), worker.run())
        .await
        .expect("worker should stop once the queue is drained");

    let stored = harness.repository.get_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Success);
}

#[tokio::test]
async fn given_job_missing_from_store_when_processed_then_nothing_happens() {
    let harness = Harness::new();
    let engine = Arc::new(ScriptedEngine::new());
    let worker = harness.worker(engine.clone(), WorkerOptions::default());
    let orphan = Job::new(AnalysisQuery::default(), StoragePath::for_upload());

    worker.process_job(orphan.id).await.unwrap();

    assert_eq!(engine.calls(), 0);
}
