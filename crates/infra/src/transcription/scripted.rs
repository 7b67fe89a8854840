//! In-process transcriber with canned outputs.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{Transcriber, TranscriptionError};

/// Canned behavior for one chunk reference.
#[derive(Debug, Clone)]
pub struct ScriptedChunk {
    text: String,
    fail_first: u32,
    delay: Duration,
}

impl ScriptedChunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fail_first: 0,
            delay: Duration::ZERO,
        }
    }

    /// Fail the first `n` calls, then succeed.
    pub fn fail_first(mut self, n: u32) -> Self {
        self.fail_first = n;
        self
    }

    /// Fail every call.
    pub fn fail_always(self) -> Self {
        self.fail_first(u32::MAX)
    }

    /// Sleep for `delay` on every call before answering.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// [`Transcriber`] answering from a fixed table of chunk scripts.
///
/// Unknown chunk references fail with [`TranscriptionError::NotFound`]. Every
/// call is recorded with its start instant so tests can inspect retry timing.
#[derive(Debug, Default)]
pub struct ScriptedTranscriber {
    chunks: HashMap<String, ScriptedChunk>,
    calls: Mutex<HashMap<String, Vec<Instant>>>,
}

impl ScriptedTranscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk(mut self, chunk_ref: impl Into<String>, chunk: ScriptedChunk) -> Self {
        self.chunks.insert(chunk_ref.into(), chunk);
        self
    }

    /// Number of calls made for `chunk_ref` so far.
    pub fn attempts(&self, chunk_ref: &str) -> usize {
        self.call_times(chunk_ref).len()
    }

    /// Start instants of every call made for `chunk_ref`.
    pub fn call_times(&self, chunk_ref: &str) -> Vec<Instant> {
        let calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.get(chunk_ref).cloned().unwrap_or_default()
    }

    fn record_call(&self, chunk_ref: &str) -> usize {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        let times = calls.entry(chunk_ref.to_string()).or_default();
        times.push(Instant::now());
        times.len() - 1
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, chunk_ref: &str) -> Result<String, TranscriptionError> {
        let call = self.record_call(chunk_ref);
        let Some(chunk) = self.chunks.get(chunk_ref) else {
            return Err(TranscriptionError::NotFound(chunk_ref.to_string()));
        };

        if !chunk.delay.is_zero() {
            tokio::time::sleep(chunk.delay).await;
        }

        if (call as u64) < u64::from(chunk.fail_first) {
            return Err(TranscriptionError::Failed(format!(
                "scripted failure {} for {chunk_ref}",
                call + 1
            )));
        }
        Ok(chunk.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fails_then_succeeds_per_script() {
        let t = ScriptedTranscriber::new()
            .with_chunk("a.wav", ScriptedChunk::new("alpha").fail_first(2));

        assert!(t.transcribe("a.wav").await.is_err());
        assert!(t.transcribe("a.wav").await.is_err());
        assert_eq!(t.transcribe("a.wav").await.unwrap(), "alpha");
        assert_eq!(t.attempts("a.wav"), 3);
    }

    #[tokio::test]
    async fn unknown_chunk_is_not_found() {
        let t = ScriptedTranscriber::new();
        assert_eq!(
            t.transcribe("missing.wav").await,
            Err(TranscriptionError::NotFound("missing.wav".to_string()))
        );
        assert_eq!(t.attempts("missing.wav"), 1);
    }
}
