//! Axum route handlers for the session, upload, classification and history APIs.

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::extraction::UploadedFile;
use crate::loader::LibraryReadiness;
use crate::models::history::HistoryEntry;
use crate::session::Session;
use crate::state::AppState;
use crate::view::{render, ViewModel};

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct TextUpdate {
    pub text: String,
}

async fn current_view(session: &Session) -> ViewModel {
    let history = session.history().entries().await;
    render(&session.snapshot(), session.readiness().current(), &history)
}

/// GET /api/v1/view
pub async fn handle_view(State(state): State<AppState>) -> Json<ViewModel> {
    Json(current_view(&state.session).await)
}

#[derive(Debug, Deserialize)]
pub struct ReadinessQuery {
    /// Hold the response until loading has settled.
    #[serde(default)]
    pub wait: bool,
}

/// GET /api/v1/libraries
pub async fn handle_libraries(
    State(state): State<AppState>,
    Query(query): Query<ReadinessQuery>,
) -> Json<LibraryReadiness> {
    let readiness = state.session.readiness();
    if query.wait {
        return Json(readiness.wait().await);
    }
    Json(readiness.current())
}

/// PUT /api/v1/session/job-description
pub async fn handle_set_job_description(
    State(state): State<AppState>,
    Json(update): Json<TextUpdate>,
) -> Json<ViewModel> {
    state.session.set_job_description(update.text);
    Json(current_view(&state.session).await)
}

/// PUT /api/v1/session/resume
pub async fn handle_set_resume(
    State(state): State<AppState>,
    Json(update): Json<TextUpdate>,
) -> Json<ViewModel> {
    state.session.set_resume_text(update.text);
    Json(current_view(&state.session).await)
}

/// POST /api/v1/session/upload
///
/// Multipart body with a single `file` part. On success the resume editor holds the
/// extracted text.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ViewModel>, AppError> {
    let file = read_upload(multipart)
        .await
        .map_err(|e| state.session.record(e))?;
    state.session.upload(file).await?;
    Ok(Json(current_view(&state.session).await))
}

/// POST /api/v1/session/classify
pub async fn handle_classify(State(state): State<AppState>) -> Result<Json<ViewModel>, AppError> {
    state.session.classify().await?;
    Ok(Json(current_view(&state.session).await))
}

/// GET /api/v1/history
pub async fn handle_history(State(state): State<AppState>) -> Json<Vec<HistoryEntry>> {
    Json(state.session.history().entries().await)
}

/// DELETE /api/v1/history
pub async fn handle_clear_history(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.session.clear_history().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid upload: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid upload: {e}")))?;

        return Ok(UploadedFile {
            filename,
            content_type,
            bytes,
        });
    }

    Err(AppError::Validation(format!(
        "Upload must include a '{UPLOAD_FIELD}' part"
    )))
}
