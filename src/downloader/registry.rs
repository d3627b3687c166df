//! In-memory job registry
//!
//! The registry is the single source of truth for what a token may retrieve.
//! All transitions happen under one `std::sync::Mutex`, held only for short
//! non-async sections.

use crate::types::{Artifact, AudioFormat, JobId, JobInfo, JobState, PackagingOutcome};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Book-keeping for one job
#[derive(Debug, Clone)]
pub(crate) struct JobRecord {
    pub(crate) url: String,
    pub(crate) format: AudioFormat,
    pub(crate) state: JobState,
    pub(crate) enumerated: Option<usize>,
    pub(crate) files: Vec<String>,
    pub(crate) artifact: Option<Artifact>,
    pub(crate) outcome: Option<PackagingOutcome>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl JobRecord {
    fn new(url: String, format: AudioFormat) -> Self {
        let now = Utc::now();
        Self {
            url,
            format,
            state: JobState::Created,
            enumerated: None,
            files: Vec::new(),
            artifact: None,
            outcome: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn info(&self, id: &JobId) -> JobInfo {
        JobInfo {
            id: id.to_string(),
            url: self.url.clone(),
            format: self.format,
            state: self.state,
            enumerated: self.enumerated,
            files: self.files.clone(),
            outcome: self.outcome,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Shared map of live jobs (cloneable, all clones see the same map)
#[derive(Clone, Default)]
pub(crate) struct JobRegistry {
    jobs: Arc<Mutex<HashMap<JobId, JobRecord>>>,
}

impl JobRegistry {
    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, JobRecord>> {
        // Every critical section leaves the map consistent, so a poisoned lock is still usable
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a freshly created job
    pub(crate) fn insert(&self, id: JobId, url: String, format: AudioFormat) {
        self.lock().insert(id, JobRecord::new(url, format));
    }

    /// Apply `f` to a live job and bump its timestamp
    ///
    /// Returns `false` when the job is gone or already purged; the pipeline
    /// treats that as cancellation.
    pub(crate) fn update(&self, id: &JobId, f: impl FnOnce(&mut JobRecord)) -> bool {
        let mut jobs = self.lock();
        match jobs.get_mut(id) {
            Some(record) if record.state != JobState::Purged => {
                f(record);
                record.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }

    /// Move a live job to `state`
    pub(crate) fn set_state(&self, id: &JobId, state: JobState) -> bool {
        self.update(id, |record| record.state = state)
    }

    /// Publish the job's artifact; it becomes claimable from here on
    pub(crate) fn mark_ready(&self, id: &JobId, artifact: Artifact, outcome: PackagingOutcome) -> bool {
        self.update(id, |record| {
            record.artifact = Some(artifact);
            record.outcome = Some(outcome);
            record.state = JobState::Ready;
        })
    }

    /// Claim a ready artifact for delivery
    ///
    /// Succeeds for exactly one caller: the job must be `Ready` and its artifact
    /// must equal `wanted`. On success the job is `Delivering` and no later claim
    /// can succeed.
    pub(crate) fn claim(&self, id: &JobId, wanted: &Artifact) -> bool {
        let mut jobs = self.lock();
        match jobs.get_mut(id) {
            Some(record)
                if record.state == JobState::Ready && record.artifact.as_ref() == Some(wanted) =>
            {
                record.state = JobState::Delivering;
                record.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }

    /// Take every idle job last touched before `cutoff`
    ///
    /// Taken jobs are marked `Purged` before the lock is released, so a
    /// concurrent retrieval cannot claim them.
    pub(crate) fn take_idle_before(&self, cutoff: DateTime<Utc>) -> Vec<JobId> {
        let mut jobs = self.lock();
        let mut taken = Vec::new();
        for (id, record) in jobs.iter_mut() {
            if record.state.is_idle() && record.updated_at < cutoff {
                record.state = JobState::Purged;
                taken.push(id.clone());
            }
        }
        taken
    }

    /// Take every job whose artifact is not streaming right now
    ///
    /// Used at shutdown. Finished deliveries are taken too: their delayed purge
    /// would not outlive the runtime. Pipelines still running for a taken job
    /// find it purged at their next transition and clean up after themselves.
    pub(crate) fn take_all_not_streaming(&self) -> Vec<JobId> {
        let mut jobs = self.lock();
        let mut taken = Vec::new();
        for (id, record) in jobs.iter_mut() {
            if !matches!(record.state, JobState::Delivering | JobState::Purged) {
                record.state = JobState::Purged;
                taken.push(id.clone());
            }
        }
        taken
    }

    /// Forget a job entirely
    pub(crate) fn remove(&self, id: &JobId) -> Option<JobRecord> {
        self.lock().remove(id)
    }

    /// Current state of a job, if it is still registered
    pub(crate) fn state(&self, id: &JobId) -> Option<JobState> {
        self.lock().get(id).map(|record| record.state)
    }

    /// Snapshot of every registered job, oldest first
    pub(crate) fn snapshot(&self) -> Vec<JobInfo> {
        let mut infos: Vec<JobInfo> = self
            .lock()
            .iter()
            .map(|(id, record)| record.info(id))
            .collect();
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        infos
    }

    /// Number of registered jobs
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}
