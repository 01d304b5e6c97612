use std::sync::Arc;

use crate::backend::InterviewBackend;
use crate::config::Config;
use crate::workflow::ReportOrchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Upstream interview API. `HttpInterviewBackend` in production.
    pub backend: Arc<dyn InterviewBackend>,
    pub orchestrator: ReportOrchestrator,
    pub config: Config,
}

impl AppState {
    pub fn new(backend: Arc<dyn InterviewBackend>, config: Config) -> Self {
        let orchestrator = ReportOrchestrator::new(backend.clone(), config.workflow);
        Self {
            backend,
            orchestrator,
            config,
        }
    }
}
