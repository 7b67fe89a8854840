use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use scribeflow_infra::jobs::JobOrchestrator;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/transcribe", post(start_job))
        .route("/transcript/search", get(search_transcripts))
        .route("/transcript/:job_id", get(get_transcript))
}

pub async fn start_job(
    Extension(orchestrator): Extension<JobOrchestrator>,
    body: Result<Json<dto::StartJobRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.body_text()),
    };

    match orchestrator.start_job(&body.user_id, body.audio_chunk_paths) {
        Ok(job_id) => Json(dto::StartJobResponse { job_id }).into_response(),
        Err(e) => errors::orchestrator_error_to_response(e),
    }
}

pub async fn get_transcript(
    Extension(orchestrator): Extension<JobOrchestrator>,
    Path(job_id): Path<String>,
) -> axum::response::Response {
    let job_id = match errors::parse_job_id(&job_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match orchestrator.get_job_result(job_id) {
        Ok(Some(record)) => Json(dto::TranscriptResultResponse {
            transcript_result: record,
        })
        .into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("job {job_id} not found"),
        ),
        Err(e) => errors::orchestrator_error_to_response(e),
    }
}

pub async fn search_transcripts(
    Extension(orchestrator): Extension<JobOrchestrator>,
    query: Result<Query<dto::SearchQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_query", e.body_text()),
    };

    let (Some(user_id), Some(job_status)) = (query.user_id, query.job_status) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "missing_params",
            "userId and jobStatus are required",
        );
    };
    let status = match errors::parse_job_status(&job_status) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match orchestrator.get_user_jobs(&user_id, status) {
        Ok(Some(jobs)) => Json(dto::TranscriptResultsResponse {
            transcript_results: jobs,
        })
        .into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("no {status} jobs for user {user_id}"),
        ),
        Err(e) => errors::orchestrator_error_to_response(e),
    }
}
