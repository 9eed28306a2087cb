use axum::Json;
use axum::extract::{Multipart, State};
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::services::{DocumentUpload, SubmissionError};
use crate::presentation::handlers::error_response::error_response;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub status: &'static str,
    pub task_id: String,
}

#[tracing::instrument(skip(state, multipart))]
pub async fn analyze_handler(State(state): State<AppState>, multipart: Multipart) -> Response {
    let (upload, query) = match read_form(multipart).await {
        Ok((Some(upload), query)) => (upload, query),
        Ok((None, _)) => {
            tracing::warn!("Analyze request with no file");
            return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read multipart");
            return error_response(e.status(), format!("Failed to read multipart: {}", e.body_text()));
        }
    };

    tracing::debug!(
        bytes = upload.data.len(),
        filename = ?upload.filename,
        content_type = ?upload.content_type,
        "Document received"
    );

    match state
        .submission_service
        .submit(upload, query.as_deref())
        .await
    {
        Ok(job_id) => (
            StatusCode::OK,
            Json(AnalyzeResponse {
                status: "processing",
                task_id: job_id.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            let status = submission_status(&e);
            if status.is_server_error() {
                tracing::error!(error = %e, "Analysis submission failed");
            } else {
                tracing::warn!(error = %e, "Analysis submission rejected");
            }
            error_response(status, e.to_string())
        }
    }
}

async fn read_form(
    mut multipart: Multipart,
) -> Result<(Option<DocumentUpload>, Option<String>), MultipartError> {
    let mut upload = None;
    let mut query = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                upload = Some(DocumentUpload {
                    data,
                    filename,
                    content_type,
                });
            }
            Some("query") => query = Some(field.text().await?),
            other => tracing::debug!(field = ?other, "Ignoring unknown form field"),
        }
    }

    Ok((upload, query))
}

fn submission_status(error: &SubmissionError) -> StatusCode {
    match error {
        SubmissionError::EmptyDocument => StatusCode::BAD_REQUEST,
        SubmissionError::DocumentTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        SubmissionError::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        SubmissionError::Storage(_) | SubmissionError::Repository(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        SubmissionError::QueueUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
