//! Job and chunk records.
//!
//! A job covers an ordered list of audio chunks for one user. Job-level fields
//! (`status`, `transcript_text`, `completed_time`) are written by the
//! orchestrator; `chunk_statuses` is written by the per-chunk workers.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::JobId;

/// Job lifecycle status: `Pending -> {Done, Failed}`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Done,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Done => "DONE",
            JobStatus::Failed => "FAILED",
        }
    }
}

impl core::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(JobStatus::Pending),
            "DONE" => Ok(JobStatus::Done),
            "FAILED" => Ok(JobStatus::Failed),
            other => Err(DomainError::invalid_id(format!(
                "jobStatus must be one of PENDING, DONE, FAILED (got '{other}')"
            ))),
        }
    }
}

/// Per-chunk status. Retries happen while the chunk stays `Pending`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChunkStatus {
    Pending,
    Done,
    Failed,
}

/// Stored state of one transcription job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub status: JobStatus,
    #[serde(default)]
    pub chunk_statuses: BTreeMap<String, ChunkStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_time: Option<DateTime<Utc>>,
}

impl Default for JobRecord {
    fn default() -> Self {
        Self {
            status: JobStatus::Pending,
            chunk_statuses: BTreeMap::new(),
            transcript_text: None,
            completed_time: None,
        }
    }
}

impl JobRecord {
    /// Merge a partial update: present fields overwrite, absent fields are kept.
    ///
    /// No transition validation happens here.
    pub fn apply(&mut self, update: &JobUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(text) = &update.transcript_text {
            self.transcript_text = Some(text.clone());
        }
        if let Some(at) = update.completed_time {
            self.completed_time = Some(at);
        }
    }

    pub fn set_chunk_status(&mut self, chunk_ref: impl Into<String>, status: ChunkStatus) {
        self.chunk_statuses.insert(chunk_ref.into(), status);
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check the record-level invariants:
    /// transcript text iff `Done`, completion time iff terminal.
    pub fn check_invariants(&self) -> DomainResult<()> {
        let has_text = self.transcript_text.is_some();
        if has_text != (self.status == JobStatus::Done) {
            return Err(DomainError::invariant(format!(
                "status {} with transcript text present={has_text}",
                self.status
            )));
        }
        let has_time = self.completed_time.is_some();
        if has_time != self.status.is_terminal() {
            return Err(DomainError::invariant(format!(
                "status {} with completed time present={has_time}",
                self.status
            )));
        }
        Ok(())
    }
}

/// Partial update for the job-level fields of a [`JobRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub transcript_text: Option<String>,
    pub completed_time: Option<DateTime<Utc>>,
}

impl JobUpdate {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn pending() -> Self {
        Self::status(JobStatus::Pending)
    }

    pub fn done(transcript_text: impl Into<String>, completed_time: DateTime<Utc>) -> Self {
        Self {
            status: Some(JobStatus::Done),
            transcript_text: Some(transcript_text.into()),
            completed_time: Some(completed_time),
        }
    }

    pub fn failed(completed_time: DateTime<Utc>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            transcript_text: None,
            completed_time: Some(completed_time),
        }
    }
}

/// A job record paired with its id, as returned by per-user queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserJob {
    pub job_id: JobId,
    #[serde(flatten)]
    pub record: JobRecord,
}

/// Validate an ordered chunk list for submission.
///
/// Chunk references must be non-blank and unique within the list.
pub fn validate_chunk_refs(chunk_refs: &[String]) -> DomainResult<()> {
    if chunk_refs.is_empty() {
        return Err(DomainError::validation("audioChunkPaths must not be empty"));
    }
    let mut seen = HashSet::with_capacity(chunk_refs.len());
    for (idx, chunk_ref) in chunk_refs.iter().enumerate() {
        if chunk_ref.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "audioChunkPaths[{idx}] must not be blank"
            )));
        }
        if !seen.insert(chunk_ref.as_str()) {
            return Err(DomainError::validation(format!(
                "duplicate chunk reference '{chunk_ref}'"
            )));
        }
    }
    Ok(())
}
