//! Traffic crossing the command channel boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{JobId, Rgb};

/// A write observed on the external canvas, possibly by another actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasWrite {
    pub x: i64,
    pub y: i64,
    pub color: Rgb,
    pub actor: String,
}

/// Who issued a send, so scheduled and corrective traffic stay distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", content = "job_id", rename_all = "snake_case")]
pub enum SendOrigin {
    Job(JobId),
    Guard,
}

impl std::fmt::Display for SendOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendOrigin::Job(id) => write!(f, "job {id}"),
            SendOrigin::Guard => f.write_str("guard"),
        }
    }
}

/// Operational announcements pushed to the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    JobStarted {
        job_id: JobId,
        total: usize,
        cursor: usize,
        timestamp: DateTime<Utc>,
    },
    JobFinished {
        job_id: JobId,
        total: usize,
        timestamp: DateTime<Utc>,
    },
    JobCanceled {
        job_id: JobId,
        drawn: usize,
        total: usize,
        timestamp: DateTime<Utc>,
    },
    SendStalled {
        job_id: JobId,
        cursor: usize,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl Notice {
    /// Get a short description of this notice for chat output.
    pub fn description(&self) -> String {
        match self {
            Notice::JobStarted {
                job_id,
                total,
                cursor,
                ..
            } => format!("Drawing {job_id}: {total} pixels, starting at {cursor}"),
            Notice::JobFinished { job_id, total, .. } => {
                format!("Finished {job_id} ({total} pixels)")
            }
            Notice::JobCanceled {
                job_id,
                drawn,
                total,
                ..
            } => format!("Canceled {job_id} after {drawn}/{total} pixels"),
            Notice::SendStalled {
                job_id,
                cursor,
                error,
                ..
            } => format!("{job_id} stalled at pixel {cursor}: {error}"),
        }
    }
}
