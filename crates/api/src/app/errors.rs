use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use scribeflow_core::{JobId, JobStatus};
use scribeflow_infra::jobs::{IndexError, OrchestratorError};

pub fn orchestrator_error_to_response(err: OrchestratorError) -> axum::response::Response {
    match err {
        OrchestratorError::InvalidInput(e) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
        }
        OrchestratorError::Consistency(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "consistency_error", msg)
        }
        OrchestratorError::Index(e @ IndexError::MissingBucket { .. }) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "consistency_error",
            e.to_string(),
        ),
        OrchestratorError::Index(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "index_error", e.to_string())
        }
        OrchestratorError::Store(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        OrchestratorError::NoRuntime => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "no_runtime",
            "no async runtime available",
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_job_id(s: &str) -> Result<JobId, axum::response::Response> {
    s.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid job id"))
}

pub fn parse_job_status(s: &str) -> Result<JobStatus, axum::response::Response> {
    s.parse().map_err(|_| {
        json_error(
            StatusCode::BAD_REQUEST,
            "invalid_job_status",
            "jobStatus must be one of: PENDING, DONE, FAILED",
        )
    })
}
