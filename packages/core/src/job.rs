//! Job domain types: a resumable, ordered batch of paint operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::{BoundingBox, PaintOp};

/// Unique identifier for a job.
///
/// Generated ids are ULIDs, so sorting ids lexicographically restores
/// registration order after a restart. Any non-empty token without path
/// separators is accepted as an id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Create a new unique job ID.
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Parse a job ID from a string.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let valid = !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
        valid.then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current state of a job in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting behind the active job.
    #[default]
    Queued,
    /// The single job currently being painted.
    Active,
    /// Head of the queue while the scheduler is paused.
    Paused,
    /// Canceled by an operator; durable state erased.
    Canceled,
    /// Every operation was sent; durable state erased.
    Done,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Active => "active",
            JobState::Paused => "paused",
            JobState::Canceled => "canceled",
            JobState::Done => "done",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resumable unit of work owned by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    /// Operations in send order; `queue[cursor..]` has not been sent yet.
    pub queue: Vec<PaintOp>,
    /// Count of operations confirmed sent.
    pub cursor: usize,
    pub bounds: BoundingBox,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Create a queued job with a fresh id.
    ///
    /// `cursor` is clamped to the queue length.
    pub fn new(queue: Vec<PaintOp>, cursor: usize, bounds: BoundingBox) -> Self {
        Self::with_id(JobId::generate(), queue, cursor, bounds)
    }

    pub fn with_id(id: JobId, queue: Vec<PaintOp>, cursor: usize, bounds: BoundingBox) -> Self {
        let cursor = cursor.min(queue.len());
        Self {
            id,
            queue,
            cursor,
            bounds,
            state: JobState::Queued,
            created_at: Utc::now(),
        }
    }

    pub fn total(&self) -> usize {
        self.queue.len()
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.queue.len()
    }

    /// The next operation to send, if any.
    pub fn next_op(&self) -> Option<PaintOp> {
        self.queue.get(self.cursor).copied()
    }

    pub fn status(&self) -> JobStatus {
        JobStatus {
            id: self.id.clone(),
            drawn: self.cursor,
            total: self.total(),
            state: self.state,
            bounds: self.bounds,
        }
    }
}

/// Progress snapshot returned by status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub id: JobId,
    pub drawn: usize,
    pub total: usize,
    pub state: JobState,
    pub bounds: BoundingBox,
}

impl JobStatus {
    /// Completion as a percentage in `0.0..=100.0`.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.drawn as f64 / self.total as f64 * 100.0
        }
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.drawn)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}/{} ({:.2}%) at {}",
            self.id,
            self.state,
            self.drawn,
            self.total,
            self.percent(),
            self.bounds
        )
    }
}
