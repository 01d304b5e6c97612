use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::errors::AppError;
use crate::models::interview::InterviewId;
use crate::state::AppState;
use crate::workflow::handlers::validate_interview_id;

/// GET /api/v1/interviews/:id/report/pdf
/// Streams the rendered PDF from the interview service.
pub async fn handle_download_report(
    State(state): State<AppState>,
    Path(interview_id): Path<InterviewId>,
) -> Result<impl IntoResponse, AppError> {
    let interview_id = validate_interview_id(interview_id)?;
    let pdf = state.backend.download_report(interview_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"interview_{interview_id}_report.pdf\""),
            ),
        ],
        pdf,
    ))
}
