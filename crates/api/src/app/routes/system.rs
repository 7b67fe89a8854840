use axum::{extract::Extension, http::StatusCode, Json};

use scribeflow_infra::jobs::{JobOrchestrator, OrchestratorStats};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn stats(Extension(orchestrator): Extension<JobOrchestrator>) -> Json<OrchestratorStats> {
    Json(orchestrator.stats())
}
