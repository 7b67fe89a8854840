//! Remote transcription capability and the retrying per-chunk client.
//!
//! - `Transcriber`: the remote capability, `chunk_ref -> text`. Fallible and
//!   assumed idempotent.
//! - `HttpTranscriber`: ASR service client over HTTP.
//! - `RetryingTranscribeClient`: bounded retries with backoff, reporting chunk
//!   status to the job store.
//! - `ScriptedTranscriber`: in-process transcriber with canned outputs, for
//!   tests and local runs.

use async_trait::async_trait;

pub mod http;
pub mod retrying;
pub mod scripted;

pub use http::HttpTranscriber;
pub use retrying::{ChunkError, RetryingTranscribeClient};
pub use scripted::{ScriptedChunk, ScriptedTranscriber};

/// The remote transcription capability.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one audio chunk.
    async fn transcribe(&self, chunk_ref: &str) -> Result<String, TranscriptionError>;
}

/// A single failed call to the remote capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptionError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote does not know the chunk.
    #[error("chunk not found: {0}")]
    NotFound(String),

    /// The remote answered with a non-success status.
    #[error("remote returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),

    /// Processing failed on the remote side.
    #[error("transcription failed: {0}")]
    Failed(String),
}
