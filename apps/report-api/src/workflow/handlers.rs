use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::errors::AppError;
use crate::models::interview::InterviewId;
use crate::state::AppState;
use crate::workflow::WorkflowSnapshot;

pub(crate) fn validate_interview_id(interview_id: InterviewId) -> Result<InterviewId, AppError> {
    if interview_id <= 0 {
        return Err(AppError::Validation(format!(
            "interview id must be positive, got {interview_id}"
        )));
    }
    Ok(interview_id)
}

/// POST /api/v1/interviews/:id/report
/// Starts the report workflow. A second call while one is running is refused.
pub async fn handle_start_report(
    State(state): State<AppState>,
    Path(interview_id): Path<InterviewId>,
) -> Result<(StatusCode, Json<WorkflowSnapshot>), AppError> {
    let interview_id = validate_interview_id(interview_id)?;
    let snapshot = state
        .orchestrator
        .start(interview_id)
        .ok_or(AppError::WorkflowInProgress(interview_id))?;
    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// GET /api/v1/interviews/:id/report
pub async fn handle_get_report(
    State(state): State<AppState>,
    Path(interview_id): Path<InterviewId>,
) -> Result<Json<WorkflowSnapshot>, AppError> {
    let interview_id = validate_interview_id(interview_id)?;
    state
        .orchestrator
        .snapshot(interview_id)
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!("No report workflow for interview {interview_id}"))
        })
}

/// DELETE /api/v1/interviews/:id/report
/// Abandons the run: pending waits are dropped and the guard released.
pub async fn handle_cancel_report(
    State(state): State<AppState>,
    Path(interview_id): Path<InterviewId>,
) -> Result<StatusCode, AppError> {
    let interview_id = validate_interview_id(interview_id)?;
    let was_running = state.orchestrator.is_running(interview_id);
    if !state.orchestrator.cancel(interview_id) {
        return Err(AppError::NotFound(format!(
            "No report workflow for interview {interview_id}"
        )));
    }
    info!("Report workflow for interview {interview_id} discarded by client (in flight: {was_running})");
    Ok(StatusCode::NO_CONTENT)
}
