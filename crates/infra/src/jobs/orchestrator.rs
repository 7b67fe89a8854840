//! Job orchestration: submission, chunk fan-out, ordered aggregation, finalization.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use scribeflow_core::{
    ChunkStatus, DomainError, JobId, JobRecord, JobStatus, JobUpdate, UserId, UserJob,
    validate_chunk_refs,
};

use super::index::{InMemoryUserIndex, IndexError, UserIndex};
use super::store::{InMemoryJobStore, JobStore, JobStoreError};
use super::types::RetryPolicy;
use crate::transcription::{ChunkError, RetryingTranscribeClient, Transcriber};

/// Orchestrator error.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Malformed submission or query; nothing was recorded.
    #[error(transparent)]
    InvalidInput(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] JobStoreError),

    #[error(transparent)]
    Index(#[from] IndexError),

    /// The user index and the job store disagree.
    #[error("consistency error: {0}")]
    Consistency(String),

    /// `start_job` was called outside a tokio runtime.
    #[error("no async runtime available to run job")]
    NoRuntime,
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    /// Retry policy applied to every chunk call
    pub retry_policy: RetryPolicy,
    /// First job id handed out
    pub first_job_id: u64,
}

impl OrchestratorConfig {
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_first_job_id(mut self, first: u64) -> Self {
        self.first_job_id = first;
        self
    }
}

/// Orchestrator runtime statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorStats {
    pub jobs_started: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub jobs_in_flight: u64,
}

#[derive(Debug, Default)]
struct Counters {
    started: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    in_flight: AtomicU64,
}

struct Inner {
    store: Arc<dyn JobStore>,
    index: Arc<dyn UserIndex>,
    client: Arc<RetryingTranscribeClient>,
    next_job_id: AtomicU64,
    counters: Counters,
    transitions: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

/// Entry point for submitting and querying transcription jobs.
///
/// `start_job` records the job and returns immediately; chunk work runs on a
/// detached task per job and one task per chunk. Results are only observable
/// by polling [`JobOrchestrator::get_job_result`] or
/// [`JobOrchestrator::get_user_jobs`].
///
/// When a chunk exhausts its retries the job is marked FAILED right away.
/// Sibling chunk calls are not cancelled: they run to completion and record
/// their own chunk status.
#[derive(Clone)]
pub struct JobOrchestrator {
    inner: Arc<Inner>,
}

impl JobOrchestrator {
    pub fn new(
        store: Arc<dyn JobStore>,
        index: Arc<dyn UserIndex>,
        transcriber: Arc<dyn Transcriber>,
        config: OrchestratorConfig,
    ) -> Self {
        let client =
            RetryingTranscribeClient::new(transcriber, Arc::clone(&store), config.retry_policy);
        Self {
            inner: Arc::new(Inner {
                store,
                index,
                client: Arc::new(client),
                next_job_id: AtomicU64::new(config.first_job_id),
                counters: Counters::default(),
                transitions: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Orchestrator over fresh in-memory store and index.
    pub fn in_memory(transcriber: Arc<dyn Transcriber>, config: OrchestratorConfig) -> Self {
        Self::new(
            InMemoryJobStore::arc(),
            InMemoryUserIndex::arc(),
            transcriber,
            config,
        )
    }

    /// Submit a job and return its id without waiting for any chunk work.
    pub fn start_job(
        &self,
        user_id: &str,
        chunk_refs: Vec<String>,
    ) -> Result<JobId, OrchestratorError> {
        let user_id = UserId::parse(user_id)?;
        validate_chunk_refs(&chunk_refs)?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| OrchestratorError::NoRuntime)?;

        let inner = &self.inner;
        let job_id = JobId::new(inner.next_job_id.fetch_add(1, Ordering::Relaxed));

        {
            let lock = inner.user_lock(&user_id);
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            inner.store.put(job_id, JobUpdate::pending())?;
            for chunk_ref in &chunk_refs {
                inner
                    .store
                    .set_chunk_status(job_id, chunk_ref, ChunkStatus::Pending)?;
            }
            inner.index.add_to_bucket(&user_id, JobStatus::Pending, job_id)?;
        }

        inner.counters.started.fetch_add(1, Ordering::Relaxed);
        inner.counters.in_flight.fetch_add(1, Ordering::Relaxed);
        info!(job_id = %job_id, user_id = %user_id, chunks = chunk_refs.len(), "job started");

        let task = Arc::clone(inner);
        runtime.spawn(async move {
            task.run_job(job_id, user_id, chunk_refs).await;
        });

        Ok(job_id)
    }

    /// Current record for `job_id`, or `None` if unknown.
    pub fn get_job_result(&self, job_id: JobId) -> Result<Option<JobRecord>, OrchestratorError> {
        Ok(self.inner.store.get(job_id)?)
    }

    /// Jobs of `user_id` currently in `status`, in ascending id order.
    ///
    /// `None` when the user has never had a job in that status. Every
    /// returned record carries `status`; a record that disagrees with its
    /// bucket is a [`OrchestratorError::Consistency`] error.
    pub fn get_user_jobs(
        &self,
        user_id: &str,
        status: JobStatus,
    ) -> Result<Option<Vec<UserJob>>, OrchestratorError> {
        let user_id = UserId::parse(user_id)?;
        let lock = self.inner.user_lock(&user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(job_ids) = self.inner.index.lookup(&user_id, status)? else {
            return Ok(None);
        };

        let mut jobs = Vec::with_capacity(job_ids.len());
        for job_id in job_ids {
            let record = self.inner.store.get(job_id)?.ok_or_else(|| {
                OrchestratorError::Consistency(format!(
                    "job {job_id} is indexed under ({user_id}, {status}) but missing from the job store"
                ))
            })?;
            if record.status != status {
                return Err(OrchestratorError::Consistency(format!(
                    "job {job_id} is indexed under ({user_id}, {status}) but its record is {}",
                    record.status
                )));
            }
            jobs.push(UserJob { job_id, record });
        }
        Ok(Some(jobs))
    }

    pub fn stats(&self) -> OrchestratorStats {
        let c = &self.inner.counters;
        OrchestratorStats {
            jobs_started: c.started.load(Ordering::Relaxed),
            jobs_succeeded: c.succeeded.load(Ordering::Relaxed),
            jobs_failed: c.failed.load(Ordering::Relaxed),
            jobs_in_flight: c.in_flight.load(Ordering::Relaxed),
        }
    }
}

impl Inner {
    /// Lock held across every index change and the store write paired with
    /// it, and across per-user reads, so readers never see one without the
    /// other.
    fn user_lock(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        let mut locks = self
            .transitions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(user_id.clone()).or_default())
    }

    async fn run_job(self: Arc<Self>, job_id: JobId, user_id: UserId, chunk_refs: Vec<String>) {
        let outcome = self.complete_job(job_id, &user_id, chunk_refs).await;
        self.counters.in_flight.fetch_sub(1, Ordering::Relaxed);

        match outcome {
            Ok(JobStatus::Done) => {
                self.counters.succeeded.fetch_add(1, Ordering::Relaxed);
            }
            Ok(_) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(job_id = %job_id, user_id = %user_id, error = %err, "job finalization failed");
            }
        }
    }

    /// Fan out every chunk, then finalize. Returns the terminal status written.
    async fn complete_job(
        &self,
        job_id: JobId,
        user_id: &UserId,
        chunk_refs: Vec<String>,
    ) -> Result<JobStatus, OrchestratorError> {
        let total = chunk_refs.len();
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, Result<String, ChunkError>)>();

        for (position, chunk_ref) in chunk_refs.into_iter().enumerate() {
            let client = Arc::clone(&self.client);
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = client.transcribe(job_id, &chunk_ref).await;
                // The receiver is gone once the job has already failed.
                let _ = tx.send((position, result));
            });
        }
        drop(tx);

        let mut slots: Vec<Option<String>> = vec![None; total];
        while let Some((position, result)) = rx.recv().await {
            match result {
                Ok(text) => slots[position] = Some(text),
                Err(err) => {
                    warn!(job_id = %job_id, error = %err, "chunk failed; failing job");
                    return self.finalize_failed(job_id, user_id);
                }
            }
        }

        // A chunk task that died without reporting leaves its slot empty.
        match slots.into_iter().collect::<Option<Vec<String>>>() {
            Some(texts) => self.finalize_done(job_id, user_id, texts.join(" ")),
            None => {
                warn!(job_id = %job_id, "chunk task ended without a result; failing job");
                self.finalize_failed(job_id, user_id)
            }
        }
    }

    fn finalize_done(
        &self,
        job_id: JobId,
        user_id: &UserId,
        transcript: String,
    ) -> Result<JobStatus, OrchestratorError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        // Index first: if the move is refused the record stays PENDING,
        // matching the bucket it is still listed under.
        self.index
            .move_to_terminal(user_id, JobStatus::Pending, JobStatus::Done, job_id)?;
        self.store.put(job_id, JobUpdate::done(transcript, Utc::now()))?;
        info!(job_id = %job_id, user_id = %user_id, "job done");
        Ok(JobStatus::Done)
    }

    fn finalize_failed(
        &self,
        job_id: JobId,
        user_id: &UserId,
    ) -> Result<JobStatus, OrchestratorError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.index
            .move_to_terminal(user_id, JobStatus::Pending, JobStatus::Failed, job_id)?;
        self.store.put(job_id, JobUpdate::failed(Utc::now()))?;
        info!(job_id = %job_id, user_id = %user_id, "job failed");
        Ok(JobStatus::Failed)
    }
}
