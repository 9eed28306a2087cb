use chrono::{DateTime, Duration, Utc};

use super::{AnalysisQuery, JobFailure, JobId, JobOutcome, JobStatus, StoragePath};

#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub query: AnalysisQuery,
    pub document_path: StoragePath,
    pub status: JobStatus,
    pub result: Option<String>,
    pub failure: Option<JobFailure>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(query: AnalysisQuery, document_path: StoragePath) -> Self {
        Self {
            id: JobId::new(),
            query,
            document_path,
            status: JobStatus::Pending,
            result: None,
            failure: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn mark_started(&mut self, at: DateTime<Utc>) {
        self.status = JobStatus::Started;
        self.started_at = Some(at);
    }

    pub fn apply_outcome(&mut self, outcome: &JobOutcome, at: DateTime<Utc>) {
        match outcome {
            JobOutcome::Succeeded(text) => {
                self.status = JobStatus::Success;
                self.result = Some(text.clone());
                self.failure = None;
            }
            JobOutcome::Failed(failure) => {
                self.status = JobStatus::Failure;
                self.result = Some(failure.render());
                self.failure = Some(failure.clone());
            }
        }
        self.completed_at = Some(at);
    }

    /// Result text visible to pollers: only once the job is terminal.
    pub fn visible_result(&self) -> Option<&str> {
        if self.status.is_terminal() {
            self.result.as_deref()
        } else {
            None
        }
    }

    /// Completed jobs stay readable for `retention` after completion;
    /// unfinished jobs never expire, nor do jobs whose expiry lies past the
    /// representable range.
    pub fn is_expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        self.completed_at
            .and_then(|completed| completed.checked_add_signed(retention))
            .is_some_and(|expires_at| expires_at <= now)
    }
}
