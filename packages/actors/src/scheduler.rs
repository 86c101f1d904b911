//! Scheduler state machine.
//!
//! [`SchedulerState`] owns the job collection and the pause/cancel flags.
//! Each call to [`SchedulerState::step`] performs at most one send, so the
//! actor driving it can interleave control messages between pixels.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use canvas_core::{DrawError, DrawResult, Job, JobId, JobState, JobStatus, Notice, SendOrigin};
use chrono::Utc;

use crate::channel::SharedChannel;
use crate::persistence::{JobStore, PersistenceError};

/// Scheduler tunables.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often durable storage is scanned and idle stepping restarted.
    pub tick_interval: Duration,
    /// Pause before retrying a failed send.
    pub retry_backoff: Duration,
    /// Persist the cursor every this many successful sends; 0 acts as 1.
    pub checkpoint_interval: usize,
    /// How many canceled jobs stay visible to status queries.
    pub history_limit: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(5),
            retry_backoff: Duration::from_secs(5),
            checkpoint_interval: 10,
            history_limit: 32,
        }
    }
}

impl SchedulerConfig {
    /// Build a config from environment variables.
    ///
    /// - `SCHEDULER_TICK_SECS` (default: 5)
    /// - `SCHEDULER_RETRY_SECS` (default: 5)
    /// - `SCHEDULER_CHECKPOINT_EVERY` (default: 10)
    pub fn from_env() -> Self {
        fn var<T: std::str::FromStr>(name: &str) -> Option<T> {
            std::env::var(name).ok()?.trim().parse().ok()
        }

        let defaults = Self::default();
        Self {
            tick_interval: var("SCHEDULER_TICK_SECS")
                .map_or(defaults.tick_interval, Duration::from_secs),
            retry_backoff: var("SCHEDULER_RETRY_SECS")
                .map_or(defaults.retry_backoff, Duration::from_secs),
            checkpoint_interval: var("SCHEDULER_CHECKPOINT_EVERY")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.checkpoint_interval),
            history_limit: defaults.history_limit,
        }
    }

    pub fn with_checkpoint_interval(mut self, every: usize) -> Self {
        self.checkpoint_interval = every.max(1);
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}

/// What to cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelTarget {
    Job(JobId),
    All,
}

/// Result of one scheduler step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing to do.
    Idle,
    /// Jobs are waiting but the pause flag is set.
    Paused,
    /// One operation was confirmed sent.
    Sent { job_id: JobId, cursor: usize },
    /// The send failed; the same operation is retried after the backoff.
    Stalled { job_id: JobId, cursor: usize },
    /// The head job sent its last operation and was retired.
    Finished(JobId),
    /// The head job was canceled and retired.
    Canceled(JobId),
}

impl StepOutcome {
    /// Whether the next step should run right away.
    pub fn has_more(&self) -> bool {
        matches!(
            self,
            StepOutcome::Sent { .. } | StepOutcome::Finished(_) | StepOutcome::Canceled(_)
        )
    }
}

/// In-memory scheduler state for one canvas.
pub struct SchedulerState {
    config: SchedulerConfig,
    store: JobStore,
    channel: SharedChannel,
    /// Registration order; the head is the only job ever sent from.
    jobs: VecDeque<Job>,
    paused: bool,
    cancel_all: bool,
    cancel_set: HashSet<JobId>,
    canceled: VecDeque<JobStatus>,
    /// Retired jobs whose durable state could not be erased yet.
    tombstones: HashSet<JobId>,
}

impl SchedulerState {
    pub fn new(config: SchedulerConfig, store: JobStore, channel: SharedChannel) -> Self {
        Self {
            config,
            store,
            channel,
            jobs: VecDeque::new(),
            paused: false,
            cancel_all: false,
            cancel_set: HashSet::new(),
            canceled: VecDeque::new(),
            tombstones: HashSet::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.jobs.iter().any(|job| &job.id == id)
    }

    /// Accept a job: persist it, then queue it behind everything else.
    ///
    /// Nothing is queued when persisting fails.
    pub async fn submit(&mut self, mut job: Job) -> DrawResult<JobId> {
        if self.contains(&job.id) || self.tombstones.contains(&job.id) {
            return Err(DrawError::DuplicateJob(job.id));
        }
        if self.store.load_queue(&job.id).await?.is_some() {
            return Err(DrawError::DuplicateJob(job.id));
        }

        self.store.register(&job).await?;

        job.state = JobState::Queued;
        self.canceled.retain(|status| status.id != job.id);
        let id = job.id.clone();
        tracing::info!(
            "Queued job {} ({} ops, cursor {}) at position {}",
            id,
            job.total(),
            job.cursor,
            self.jobs.len()
        );
        self.jobs.push_back(job);
        Ok(id)
    }

    pub fn pause(&mut self) {
        if !self.paused {
            tracing::info!("Scheduler paused");
        }
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            tracing::info!("Scheduler resumed");
        }
        self.paused = false;
    }

    /// Request cancellation; it takes effect on the next step.
    pub fn cancel(&mut self, target: CancelTarget) -> DrawResult<()> {
        match target {
            CancelTarget::Job(id) => {
                if !self.contains(&id) {
                    return Err(DrawError::JobNotFound(id));
                }
                tracing::info!("Cancel requested for job {}", id);
                self.cancel_set.insert(id);
            }
            CancelTarget::All => {
                if !self.jobs.is_empty() {
                    tracing::info!("Cancel requested for all {} jobs", self.jobs.len());
                    self.cancel_all = true;
                }
            }
        }
        Ok(())
    }

    /// Progress of a queued, active or recently canceled job.
    ///
    /// Finished jobs are absent.
    pub fn status(&self, id: &JobId) -> Option<JobStatus> {
        self.jobs
            .iter()
            .position(|job| &job.id == id)
            .map(|index| self.status_at(index))
            .or_else(|| self.canceled.iter().find(|s| &s.id == id).cloned())
    }

    /// Every live job in queue order.
    pub fn list(&self) -> Vec<JobStatus> {
        (0..self.jobs.len()).map(|i| self.status_at(i)).collect()
    }

    fn status_at(&self, index: usize) -> JobStatus {
        let mut status = self.jobs[index].status();
        if index == 0 && self.paused {
            status.state = JobState::Paused;
        }
        status
    }

    /// Register durable jobs not known in memory, in id order.
    ///
    /// Also retries erasing jobs whose cleanup failed earlier.
    pub async fn discover(&mut self) -> Result<usize, PersistenceError> {
        self.sweep_tombstones().await;

        let mut found = 0;
        for id in self.store.list_queues().await? {
            if self.contains(&id) || self.tombstones.contains(&id) {
                continue;
            }
            if let Some(job) = self.store.restore(&id).await? {
                self.jobs.push_back(job);
                found += 1;
            }
        }
        if found > 0 {
            tracing::info!("Discovered {} persisted jobs", found);
        }
        Ok(found)
    }

    async fn sweep_tombstones(&mut self) {
        let pending: Vec<JobId> = self.tombstones.iter().cloned().collect();
        for id in pending {
            match self.store.erase(&id).await {
                Ok(()) => {
                    self.tombstones.remove(&id);
                }
                Err(e) => tracing::warn!("Still unable to erase job {}: {}", id, e),
            }
        }
    }

    /// Run one iteration of the painting loop.
    pub async fn step(&mut self) -> StepOutcome {
        if self.jobs.is_empty() {
            self.cancel_all = false;
            return StepOutcome::Idle;
        }
        if self.paused {
            return StepOutcome::Paused;
        }

        let cancel_all = self.cancel_all;
        let Some(head) = self.jobs.front_mut() else {
            return StepOutcome::Idle;
        };

        if head.state != JobState::Active {
            head.state = JobState::Active;
            tracing::info!(
                "Starting job {} at {}/{}",
                head.id,
                head.cursor,
                head.total()
            );
            self.channel.announce(Notice::JobStarted {
                job_id: head.id.clone(),
                total: head.total(),
                cursor: head.cursor,
                timestamp: Utc::now(),
            });
        }

        if cancel_all || self.cancel_set.contains(&head.id) {
            return self.retire_head(JobState::Canceled).await;
        }

        let Some(op) = head.next_op() else {
            return self.retire_head(JobState::Done).await;
        };

        let job_id = head.id.clone();
        match self.channel.send(op, SendOrigin::Job(job_id.clone())).await {
            Ok(()) => {
                head.cursor += 1;
                let cursor = head.cursor;
                tracing::debug!("Job {} sent {} ({}/{})", job_id, op, cursor, head.total());

                if head.is_finished() {
                    return self.retire_head(JobState::Done).await;
                }
                if cursor % self.config.checkpoint_interval.max(1) == 0
                    && let Err(e) = self.store.checkpoint(&job_id, cursor).await
                {
                    tracing::warn!("Failed to checkpoint job {} at {}: {}", job_id, cursor, e);
                }
                StepOutcome::Sent { job_id, cursor }
            }
            Err(e) => {
                let cursor = head.cursor;
                tracing::warn!("Job {} stalled at {}: {}", job_id, cursor, e);
                self.channel.announce(Notice::SendStalled {
                    job_id: job_id.clone(),
                    cursor,
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                StepOutcome::Stalled { job_id, cursor }
            }
        }
    }

    async fn retire_head(&mut self, state: JobState) -> StepOutcome {
        let Some(mut job) = self.jobs.pop_front() else {
            return StepOutcome::Idle;
        };
        job.state = state;
        self.cancel_set.remove(&job.id);

        if let Err(e) = self.store.erase(&job.id).await {
            tracing::warn!("Failed to erase job {}: {}", job.id, e);
            self.tombstones.insert(job.id.clone());
        }

        if self.jobs.is_empty() {
            self.cancel_all = false;
        }

        let timestamp = Utc::now();
        match state {
            JobState::Canceled => {
                tracing::info!("Canceled job {} at {}/{}", job.id, job.cursor, job.total());
                self.channel.announce(Notice::JobCanceled {
                    job_id: job.id.clone(),
                    drawn: job.cursor,
                    total: job.total(),
                    timestamp,
                });
                self.canceled.push_back(job.status());
                while self.canceled.len() > self.config.history_limit {
                    self.canceled.pop_front();
                }
                StepOutcome::Canceled(job.id)
            }
            _ => {
                tracing::info!("Finished job {} ({} ops)", job.id, job.total());
                self.channel.announce(Notice::JobFinished {
                    job_id: job.id.clone(),
                    total: job.total(),
                    timestamp,
                });
                StepOutcome::Finished(job.id)
            }
        }
    }

    /// Persist the active job's cursor, e.g. before shutting down.
    pub async fn flush(&self) -> Result<(), PersistenceError> {
        if let Some(head) = self.jobs.front().filter(|job| job.cursor > 0) {
            self.store.checkpoint(&head.id, head.cursor).await?;
            tracing::info!("Checkpointed job {} at {}", head.id, head.cursor);
        }
        Ok(())
    }
}
