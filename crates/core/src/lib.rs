//! `scribeflow-core`: domain building blocks for transcription jobs.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod job;

pub use error::{DomainError, DomainResult};
pub use id::{JobId, UserId};
pub use job::{ChunkStatus, JobRecord, JobStatus, JobUpdate, UserJob, validate_chunk_refs};
