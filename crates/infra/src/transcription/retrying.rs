//! Per-chunk transcription with bounded retries and backoff.

use std::sync::Arc;

use tracing::{debug, error, warn};

use scribeflow_core::{ChunkStatus, JobId};

use super::{Transcriber, TranscriptionError};
use crate::jobs::store::{JobStore, JobStoreError};
use crate::jobs::types::RetryPolicy;

/// Terminal failure of one chunk.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChunkError {
    /// The retry budget was exhausted; the chunk is recorded as FAILED.
    #[error("chunk '{chunk_ref}' failed after {attempts} attempt(s): {source}")]
    Exhausted {
        chunk_ref: String,
        attempts: u32,
        #[source]
        source: TranscriptionError,
    },

    /// Recording the chunk status failed.
    #[error(transparent)]
    Store(#[from] JobStoreError),
}

/// Calls the remote [`Transcriber`] for one chunk, retrying per [`RetryPolicy`].
///
/// Chunk status is written to the job store before the first attempt
/// (`PENDING`) and once the outcome is known (`DONE` / `FAILED`). Backoff
/// waits suspend only the calling task.
#[derive(Clone)]
pub struct RetryingTranscribeClient {
    transcriber: Arc<dyn Transcriber>,
    store: Arc<dyn JobStore>,
    policy: RetryPolicy,
}

impl RetryingTranscribeClient {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        store: Arc<dyn JobStore>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transcriber,
            store,
            policy,
        }
    }

    /// Transcribe `chunk_ref` for `job_id`.
    pub async fn transcribe(&self, job_id: JobId, chunk_ref: &str) -> Result<String, ChunkError> {
        self.store
            .set_chunk_status(job_id, chunk_ref, ChunkStatus::Pending)?;

        let mut attempt: u32 = 0;
        loop {
            match self.transcriber.transcribe(chunk_ref).await {
                Ok(text) => {
                    self.store
                        .set_chunk_status(job_id, chunk_ref, ChunkStatus::Done)?;
                    debug!(job_id = %job_id, chunk = chunk_ref, attempt, "chunk transcribed");
                    return Ok(text);
                }
                Err(err) if self.policy.should_retry(attempt) => {
                    let delay = self.policy.delay_for_retry(attempt);
                    warn!(
                        job_id = %job_id,
                        chunk = chunk_ref,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "chunk transcription failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    let attempts = attempt + 1;
                    error!(
                        job_id = %job_id,
                        chunk = chunk_ref,
                        attempts,
                        error = %err,
                        "chunk transcription exhausted retries"
                    );
                    if let Err(store_err) =
                        self.store
                            .set_chunk_status(job_id, chunk_ref, ChunkStatus::Failed)
                    {
                        error!(job_id = %job_id, chunk = chunk_ref, error = %store_err, "failed to record chunk failure");
                    }
                    return Err(ChunkError::Exhausted {
                        chunk_ref: chunk_ref.to_string(),
                        attempts,
                        source: err,
                    });
                }
            }
        }
    }
}
