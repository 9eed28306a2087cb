use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;

use findoc_analyzer::application::ports::{JobQueue, JobRepository, StagingStore};
use findoc_analyzer::application::services::{
    DocumentUpload, SubmissionError, SubmissionService, UploadPolicy,
};
use findoc_analyzer::domain::{FailureKind, JobStatus};
use findoc_analyzer::infrastructure::persistence::InMemoryJobRepository;
use findoc_analyzer::infrastructure::queue::ChannelJobQueue;
use findoc_analyzer::infrastructure::storage::LocalStagingStore;

use crate::helpers::{FailingStagingStore, stored_job_count, temp_staging_store};

struct Fixture {
    _dir: tempfile::TempDir,
    staging: Arc<LocalStagingStore>,
    repository: Arc<InMemoryJobRepository>,
    queue: Arc<ChannelJobQueue>,
    service: SubmissionService,
}

fn policy() -> UploadPolicy {
    UploadPolicy {
        max_bytes: 1024,
        allowed_content_types: vec!["application/pdf".to_string()],
    }
}

fn fixture_with_queue(capacity: usize) -> Fixture {
    let (dir, staging) = temp_staging_store();
    let repository = Arc::new(InMemoryJobRepository::new(chrono::Duration::hours(1)));
    let queue = Arc::new(ChannelJobQueue::new(capacity));
    let service = SubmissionService::new(
        staging.clone(),
        repository.clone(),
        queue.clone(),
        policy(),
    );
    Fixture {
        _dir: dir,
        staging,
        repository,
        queue,
        service,
    }
}

fn pdf_upload(data: &'static [u8]) -> DocumentUpload {
    DocumentUpload {
        data: Bytes::from_static(data),
        filename: Some("report.pdf".to_string()),
        content_type: Some("application/pdf".to_string()),
    }
}

#[tokio::test]
async fn given_valid_upload_when_submitting_then_pending_job_is_recorded_and_queued() {
    let fx = fixture_with_queue(8);

    let job_id = fx
        .service
        .submit(pdf_upload(b"%PDF-1.4 quarterly"), Some("Summarize revenue"))
        .await
        .unwrap();

    let job = fx.repository.get_by_id(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.query.as_str(), "Summarize revenue");
    assert!(job.visible_result().is_none());
    assert_eq!(fx.queue.len(), 1);
    assert_eq!(fx.queue.dequeue().await, Some(job_id));
}

#[tokio::test]
async fn given_valid_upload_when_submitting_then_document_is_fully_staged_before_return() {
    let fx = fixture_with_queue(8);

    let job_id = fx
        .service
        .submit(pdf_upload(b"%PDF-1.4 balance sheet"), None)
        .await
        .unwrap();

    let job = fx.repository.get_by_id(job_id).await.unwrap().unwrap();
    assert!(job.document_path.as_str().starts_with("financial_document_"));
    assert!(job.document_path.as_str().ends_with(".pdf"));
    let stored = fx.staging.fetch(&job.document_path).await.unwrap();
    assert_eq!(stored, b"%PDF-1.4 balance sheet");
}

#[tokio::test]
async fn given_blank_query_when_submitting_then_job_carries_default_prompt() {
    let fx = fixture_with_queue(8);

    let job_id = fx.service.submit(pdf_upload(b"%PDF-1.4"), Some("  ")).await.unwrap();

    let job = fx.repository.get_by_id(job_id).await.unwrap().unwrap();
    assert!(job.query.is_default());
}

#[tokio::test]
async fn given_many_submissions_when_collecting_ids_then_all_are_unique() {
    let fx = fixture_with_queue(256);
    let mut ids = HashSet::new();

    for _ in 0..100 {
        let id = fx.service.submit(pdf_upload(b"%PDF-1.4"), None).await.unwrap();
        ids.insert(id);
    }

    assert_eq!(ids.len(), 100);
}

#[tokio::test]
async fn given_empty_upload_when_submitting_then_rejected_without_job() {
    let fx = fixture_with_queue(8);

    let result = fx.service.submit(pdf_upload(b""), None).await;

    assert!(matches!(result, Err(SubmissionError::EmptyDocument)));
    assert_eq!(stored_job_count(fx.repository.as_ref()).await, 0);
    assert!(fx.queue.is_empty());
}

#[tokio::test]
async fn given_oversized_upload_when_submitting_then_rejected_as_too_large() {
    let fx = fixture_with_queue(8);
    let upload = DocumentUpload {
        data: Bytes::from(vec![b'x'; 2048]),
        filename: None,
        content_type: None,
    };

    let result = fx.service.submit(upload, None).await;

    assert!(matches!(
        result,
        Err(SubmissionError::DocumentTooLarge { size: 2048, limit: 1024 })
    ));
    assert_eq!(stored_job_count(fx.repository.as_ref()).await, 0);
}

#[tokio::test]
async fn given_disallowed_content_type_when_submitting_then_rejected() {
    let fx = fixture_with_queue(8);
    let upload = DocumentUpload {
        data: Bytes::from_static(b"GIF89a"),
        filename: Some("chart.gif".to_string()),
        content_type: Some("image/gif".to_string()),
    };

    let result = fx.service.submit(upload, None).await;

    assert!(matches!(result, Err(SubmissionError::UnsupportedContentType(ct)) if ct == "image/gif"));
}

#[tokio::test]
async fn given_content_type_with_parameters_when_submitting_then_essence_is_checked() {
    let fx = fixture_with_queue(8);
    let upload = DocumentUpload {
        data: Bytes::from_static(b"%PDF-1.7"),
        filename: None,
        content_type: Some("Application/PDF; name=report.pdf".to_string()),
    };

    assert!(fx.service.submit(upload, None).await.is_ok());
}

#[tokio::test]
async fn given_missing_content_type_when_submitting_then_upload_is_accepted() {
    let fx = fixture_with_queue(8);
    let upload = DocumentUpload {
        data: Bytes::from_static(b"%PDF-1.7"),
        filename: None,
        content_type: None,
    };

    assert!(fx.service.submit(upload, None).await.is_ok());
}

#[tokio::test]
async fn given_failing_storage_when_submitting_then_storage_error_and_no_job() {
    let repository = Arc::new(InMemoryJobRepository::new(chrono::Duration::hours(1)));
    let queue = Arc::new(ChannelJobQueue::new(8));
    let service = SubmissionService::new(
        Arc::new(FailingStagingStore),
        repository.clone(),
        queue.clone(),
        policy(),
    );

    let result = service.submit(pdf_upload(b"%PDF-1.4"), None).await;

    assert!(matches!(result, Err(SubmissionError::Storage(_))));
    assert_eq!(stored_job_count(repository.as_ref()).await, 0);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn given_full_queue_when_submitting_then_job_is_recorded_as_queue_failure() {
    let fx = fixture_with_queue(1);
    fx.service.submit(pdf_upload(b"%PDF-1.4 first"), None).await.unwrap();

    let result = fx.service.submit(pdf_upload(b"%PDF-1.4 second"), None).await;

    assert!(matches!(result, Err(SubmissionError::QueueUnavailable(_))));
    let failed = fx.repository.list_by_status(JobStatus::Failure).await.unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(
        failed[0].failure.as_ref().map(|f| f.kind),
        Some(FailureKind::QueueUnavailable)
    );
}

#[tokio::test]
async fn given_closed_queue_when_submitting_then_queue_unavailable() {
    let fx = fixture_with_queue(8);
    fx.queue.close().await;

    let result = fx.service.submit(pdf_upload(b"%PDF-1.4"), None).await;

    assert!(matches!(result, Err(SubmissionError::QueueUnavailable(_))));
}

#[tokio::test]
async fn given_unknown_id_when_getting_status_then_returns_none() {
    let fx = fixture_with_queue(8);

    let status = fx
        .service
        .get_status(findoc_analyzer::domain::JobId::new())
        .await
        .unwrap();

    assert!(status.is_none());
}
