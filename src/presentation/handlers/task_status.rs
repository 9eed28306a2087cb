use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::{Job, JobFailure, JobId, JobStatus};
use crate::presentation::config::UnknownJobPolicy;
use crate::presentation::handlers::error_response::error_response;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct TaskStatusResponse {
    pub task_id: String,
    pub status: JobStatus,
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobFailure>,
}

impl TaskStatusResponse {
    fn from_job(job: &Job) -> Self {
        Self {
            task_id: job.id.to_string(),
            status: job.status,
            result: job.visible_result().map(str::to_string),
            error: job.failure.clone(),
        }
    }

    fn pending(task_id: String) -> Self {
        Self {
            task_id,
            status: JobStatus::Pending,
            result: None,
            error: None,
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn task_status_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Response {
    let job_id: JobId = match task_id.parse() {
        Ok(id) => id,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid task ID: {}", task_id),
            );
        }
    };

    match state.submission_service.get_status(job_id).await {
        Ok(Some(job)) => (StatusCode::OK, Json(TaskStatusResponse::from_job(&job))).into_response(),
        Ok(None) => match state.unknown_job_policy {
            UnknownJobPolicy::NotFound => error_response(
                StatusCode::NOT_FOUND,
                format!("Task not found: {}", task_id),
            ),
            UnknownJobPolicy::Pending => (
                StatusCode::OK,
                Json(TaskStatusResponse::pending(job_id.to_string())),
            )
                .into_response(),
        },
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch task status");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch task: {}", e),
            )
        }
    }
}
