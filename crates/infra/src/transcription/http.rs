//! HTTP client for an ASR service.
//!
//! Calls `GET {base_url}/get-asr-output?path=<chunk_ref>` and expects
//! `{ "path": ..., "transcript": ... }` on success.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{Transcriber, TranscriptionError};

#[derive(Debug, Deserialize)]
struct AsrOutput {
    transcript: String,
}

/// [`Transcriber`] backed by a remote ASR HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpTranscriber {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTranscriber {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TranscriptionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranscriptionError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/get-asr-output", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, chunk_ref: &str) -> Result<String, TranscriptionError> {
        let res = self
            .client
            .get(&self.endpoint)
            .query(&[("path", chunk_ref)])
            .send()
            .await
            .map_err(|e| TranscriptionError::Transport(e.to_string()))?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TranscriptionError::NotFound(chunk_ref.to_string()));
        }
        if !status.is_success() {
            let message = res.text().await.unwrap_or_default();
            return Err(TranscriptionError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: AsrOutput = res
            .json()
            .await
            .map_err(|e| TranscriptionError::Decode(e.to_string()))?;
        Ok(body.transcript)
    }
}
