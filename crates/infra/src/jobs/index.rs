//! Secondary index: (user, job status) -> job ids.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use scribeflow_core::{JobId, JobStatus, UserId};

/// Secondary index over job status, scoped per user.
///
/// Each job id lives in exactly one `(user, status)` bucket. The component
/// driving job-status transitions keeps this in step with the [`JobStore`].
///
/// [`JobStore`]: super::store::JobStore
pub trait UserIndex: Send + Sync {
    /// Insert `job_id` into the `(user_id, status)` bucket, creating it if absent.
    fn add_to_bucket(
        &self,
        user_id: &UserId,
        status: JobStatus,
        job_id: JobId,
    ) -> Result<(), IndexError>;

    /// Atomically move `job_id` from the `from` bucket into the terminal `to` bucket.
    ///
    /// Fails with [`IndexError::MissingBucket`] when the source bucket does not
    /// exist or does not hold `job_id`; nothing is changed in that case.
    fn move_to_terminal(
        &self,
        user_id: &UserId,
        from: JobStatus,
        to: JobStatus,
        job_id: JobId,
    ) -> Result<(), IndexError>;

    /// Job ids in the `(user_id, status)` bucket, or `None` if it was never created.
    fn lookup(
        &self,
        user_id: &UserId,
        status: JobStatus,
    ) -> Result<Option<BTreeSet<JobId>>, IndexError>;
}

/// User index error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("bucket ({user_id}, {status}) is missing or does not contain job {job_id}")]
    MissingBucket {
        user_id: UserId,
        status: JobStatus,
        job_id: JobId,
    },
    #[error("cannot move job {job_id} to non-terminal status {status}")]
    NonTerminalTarget { job_id: JobId, status: JobStatus },
    #[error("storage error: {0}")]
    Storage(String),
}

fn poisoned<T>(_: PoisonError<T>) -> IndexError {
    IndexError::Storage("lock poisoned".to_string())
}

type UserBuckets = Arc<Mutex<HashMap<JobStatus, BTreeSet<JobId>>>>;

/// In-memory user index with one lock per user.
#[derive(Debug, Default)]
pub struct InMemoryUserIndex {
    users: RwLock<HashMap<UserId, UserBuckets>>,
}

impl InMemoryUserIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn buckets(&self, user_id: &UserId) -> Result<Option<UserBuckets>, IndexError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(user_id).cloned())
    }

    fn buckets_or_insert(&self, user_id: &UserId) -> Result<UserBuckets, IndexError> {
        if let Some(buckets) = self.buckets(user_id)? {
            return Ok(buckets);
        }
        let mut users = self.users.write().map_err(poisoned)?;
        Ok(Arc::clone(users.entry(user_id.clone()).or_default()))
    }
}

impl UserIndex for InMemoryUserIndex {
    fn add_to_bucket(
        &self,
        user_id: &UserId,
        status: JobStatus,
        job_id: JobId,
    ) -> Result<(), IndexError> {
        let buckets = self.buckets_or_insert(user_id)?;
        let mut buckets = buckets.lock().map_err(poisoned)?;
        buckets.entry(status).or_default().insert(job_id);
        Ok(())
    }

    fn move_to_terminal(
        &self,
        user_id: &UserId,
        from: JobStatus,
        to: JobStatus,
        job_id: JobId,
    ) -> Result<(), IndexError> {
        if !to.is_terminal() {
            return Err(IndexError::NonTerminalTarget { job_id, status: to });
        }
        let missing = || IndexError::MissingBucket {
            user_id: user_id.clone(),
            status: from,
            job_id,
        };

        let buckets = self.buckets(user_id)?.ok_or_else(missing)?;
        let mut buckets = buckets.lock().map_err(poisoned)?;

        let removed = buckets
            .get_mut(&from)
            .is_some_and(|bucket| bucket.remove(&job_id));
        if !removed {
            return Err(missing());
        }
        buckets.entry(to).or_default().insert(job_id);
        Ok(())
    }

    fn lookup(
        &self,
        user_id: &UserId,
        status: JobStatus,
    ) -> Result<Option<BTreeSet<JobId>>, IndexError> {
        let Some(buckets) = self.buckets(user_id)? else {
            return Ok(None);
        };
        let buckets = buckets.lock().map_err(poisoned)?;
        Ok(buckets.get(&status).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(s: &str) -> UserId {
        UserId::parse(s).unwrap()
    }

    #[test]
    fn lookup_without_bucket_is_none() {
        let index = InMemoryUserIndex::new();
        assert_eq!(index.lookup(&user("u1"), JobStatus::Pending).unwrap(), None);
    }

    #[test]
    fn move_to_terminal_transfers_membership() {
        let index = InMemoryUserIndex::new();
        let u1 = user("u1");
        let job = JobId::new(1);

        index.add_to_bucket(&u1, JobStatus::Pending, job).unwrap();
        index
            .move_to_terminal(&u1, JobStatus::Pending, JobStatus::Done, job)
            .unwrap();

        let pending = index.lookup(&u1, JobStatus::Pending).unwrap().unwrap();
        assert!(pending.is_empty());
        let done = index.lookup(&u1, JobStatus::Done).unwrap().unwrap();
        assert_eq!(done.into_iter().collect::<Vec<_>>(), vec![job]);
        assert_eq!(index.lookup(&u1, JobStatus::Failed).unwrap(), None);
    }

    #[test]
    fn move_without_source_bucket_is_an_error() {
        let index = InMemoryUserIndex::new();
        let u1 = user("u1");
        let job = JobId::new(5);

        let err = index
            .move_to_terminal(&u1, JobStatus::Pending, JobStatus::Failed, job)
            .unwrap_err();
        assert!(matches!(err, IndexError::MissingBucket { .. }));

        // Bucket exists but does not contain the job: still an error, nothing moved.
        index.add_to_bucket(&u1, JobStatus::Pending, JobId::new(6)).unwrap();
        let err = index
            .move_to_terminal(&u1, JobStatus::Pending, JobStatus::Failed, job)
            .unwrap_err();
        assert_eq!(
            err,
            IndexError::MissingBucket {
                user_id: u1.clone(),
                status: JobStatus::Pending,
                job_id: job,
            }
        );
        assert_eq!(index.lookup(&u1, JobStatus::Failed).unwrap(), None);
    }

    #[test]
    fn move_to_pending_is_rejected() {
        let index = InMemoryUserIndex::new();
        let u1 = user("u1");
        index.add_to_bucket(&u1, JobStatus::Done, JobId::new(1)).unwrap();

        let err = index
            .move_to_terminal(&u1, JobStatus::Done, JobStatus::Pending, JobId::new(1))
            .unwrap_err();
        assert!(matches!(err, IndexError::NonTerminalTarget { .. }));
        assert!(index.lookup(&u1, JobStatus::Done).unwrap().unwrap().contains(&JobId::new(1)));
    }

    #[test]
    fn users_are_isolated() {
        let index = InMemoryUserIndex::new();
        index.add_to_bucket(&user("u1"), JobStatus::Pending, JobId::new(1)).unwrap();
        index.add_to_bucket(&user("u2"), JobStatus::Pending, JobId::new(2)).unwrap();

        let u1 = index.lookup(&user("u1"), JobStatus::Pending).unwrap().unwrap();
        assert!(u1.contains(&JobId::new(1)));
        assert!(!u1.contains(&JobId::new(2)));
    }

    #[test]
    fn concurrent_moves_keep_each_job_in_one_bucket() {
        let index = InMemoryUserIndex::arc();
        let u1 = user("u1");
        for i in 0..64 {
            index.add_to_bucket(&u1, JobStatus::Pending, JobId::new(i)).unwrap();
        }

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let index = Arc::clone(&index);
                let u1 = u1.clone();
                std::thread::spawn(move || {
                    let to = if i % 2 == 0 { JobStatus::Done } else { JobStatus::Failed };
                    index
                        .move_to_terminal(&u1, JobStatus::Pending, to, JobId::new(i))
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let pending = index.lookup(&u1, JobStatus::Pending).unwrap().unwrap();
        let done = index.lookup(&u1, JobStatus::Done).unwrap().unwrap();
        let failed = index.lookup(&u1, JobStatus::Failed).unwrap().unwrap();
        assert!(pending.is_empty());
        assert_eq!(done.len(), 32);
        assert_eq!(failed.len(), 32);
        assert!(done.is_disjoint(&failed));
    }
}
