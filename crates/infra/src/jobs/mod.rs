//! Transcription job orchestration.
//!
//! ## Components
//!
//! - `JobStore`: job records keyed by job id (in-memory or durable)
//! - `UserIndex`: secondary index of job ids by (user, status)
//! - `RetryPolicy`: bounded retries with backoff for chunk calls
//! - `JobOrchestrator`: submission, chunk fan-out, aggregation, finalization
//!
//! ## Consistency
//!
//! Job-level status transitions are written to the store first and then
//! mirrored into the user index. Index disagreements surface as errors.

pub mod index;
pub mod orchestrator;
pub mod store;
pub mod types;

pub use index::{InMemoryUserIndex, IndexError, UserIndex};
pub use orchestrator::{JobOrchestrator, OrchestratorConfig, OrchestratorError, OrchestratorStats};
pub use store::{InMemoryJobStore, JobStore, JobStoreError};
pub use types::{BackoffStrategy, RetryPolicy};
