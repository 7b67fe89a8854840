//! Job record storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use scribeflow_core::{ChunkStatus, JobId, JobRecord, JobUpdate};

/// Key-value store of job records.
///
/// Writes to the same job are serialized; writes to different jobs are
/// independent. Implementations perform no status-transition validation.
pub trait JobStore: Send + Sync {
    /// Merge the present fields of `update` into the record, creating it if absent.
    fn put(&self, job_id: JobId, update: JobUpdate) -> Result<(), JobStoreError>;

    /// Set one chunk's status, creating the record if absent.
    fn set_chunk_status(
        &self,
        job_id: JobId,
        chunk_ref: &str,
        status: ChunkStatus,
    ) -> Result<(), JobStoreError>;

    /// Get a snapshot of a job record.
    fn get(&self, job_id: JobId) -> Result<Option<JobRecord>, JobStoreError>;
}

/// Job store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JobStoreError {
    #[error("storage error: {0}")]
    Storage(String),
}

fn poisoned<T>(_: PoisonError<T>) -> JobStoreError {
    JobStoreError::Storage("lock poisoned".to_string())
}

type RecordSlot = Arc<Mutex<JobRecord>>;

/// In-memory job store.
///
/// The outer map lock is held only to find or insert a record slot; each
/// record has its own mutex, so chunk workers of one job serialize on that
/// job alone.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, RecordSlot>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of stored job records.
    pub fn len(&self) -> Result<usize, JobStoreError> {
        Ok(self.jobs.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, JobStoreError> {
        Ok(self.len()? == 0)
    }

    fn slot(&self, job_id: JobId) -> Result<RecordSlot, JobStoreError> {
        if let Some(slot) = self.jobs.read().map_err(poisoned)?.get(&job_id) {
            return Ok(Arc::clone(slot));
        }
        let mut jobs = self.jobs.write().map_err(poisoned)?;
        Ok(Arc::clone(jobs.entry(job_id).or_default()))
    }

    fn existing_slot(&self, job_id: JobId) -> Result<Option<RecordSlot>, JobStoreError> {
        let jobs = self.jobs.read().map_err(poisoned)?;
        Ok(jobs.get(&job_id).cloned())
    }
}

impl JobStore for InMemoryJobStore {
    fn put(&self, job_id: JobId, update: JobUpdate) -> Result<(), JobStoreError> {
        let slot = self.slot(job_id)?;
        let mut record = slot.lock().map_err(poisoned)?;
        record.apply(&update);
        Ok(())
    }

    fn set_chunk_status(
        &self,
        job_id: JobId,
        chunk_ref: &str,
        status: ChunkStatus,
    ) -> Result<(), JobStoreError> {
        let slot = self.slot(job_id)?;
        let mut record = slot.lock().map_err(poisoned)?;
        record.set_chunk_status(chunk_ref, status);
        Ok(())
    }

    fn get(&self, job_id: JobId) -> Result<Option<JobRecord>, JobStoreError> {
        match self.existing_slot(job_id)? {
            Some(slot) => {
                let record = slot.lock().map_err(poisoned)?;
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }
}
