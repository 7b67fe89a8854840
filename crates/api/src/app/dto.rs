use serde::{Deserialize, Serialize};

use scribeflow_core::{JobId, JobRecord, UserJob};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobRequest {
    pub user_id: String,
    pub audio_chunk_paths: Vec<String>,
}

/// Query string of `GET /transcript/search`. Both fields are required; they
/// are optional here so a missing one maps to our own 400 body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub user_id: Option<String>,
    pub job_status: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobResponse {
    pub job_id: JobId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResultResponse {
    pub transcript_result: JobRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResultsResponse {
    pub transcript_results: Vec<UserJob>,
}
