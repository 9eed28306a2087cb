use std::sync::Arc;

use crate::application::services::SubmissionService;
use crate::presentation::config::UnknownJobPolicy;

#[derive(Clone)]
pub struct AppState {
    pub submission_service: Arc<SubmissionService>,
    pub unknown_job_policy: UnknownJobPolicy,
}

impl AppState {
    pub fn new(submission_service: Arc<SubmissionService>, unknown_job_policy: UnknownJobPolicy) -> Self {
        Self {
            submission_service,
            unknown_job_policy,
        }
    }
}
