pub mod health;

use axum::{routing::get, Router};

use crate::report::handlers as report_handlers;
use crate::state::AppState;
use crate::workflow::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Report workflow
        .route(
            "/api/v1/interviews/:id/report",
            get(handlers::handle_get_report)
                .post(handlers::handle_start_report)
                .delete(handlers::handle_cancel_report),
        )
        // Report export
        .route(
            "/api/v1/interviews/:id/report/pdf",
            get(report_handlers::handle_download_report),
        )
        .with_state(state)
}
