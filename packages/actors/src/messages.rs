//! Message types for actor communication.

use canvas_core::{CanvasWrite, DrawResult, Job, JobId, JobStatus, Rgb};
use ractor::RpcReplyPort;

use crate::guard::{MismatchReport, ReferenceImage};
use crate::scheduler::CancelTarget;

/// Messages for the SchedulerActor.
#[derive(Debug)]
pub enum SchedulerMessage {
    /// Queue a new job behind all others.
    Submit {
        job: Box<Job>,
        reply: RpcReplyPort<DrawResult<JobId>>,
    },

    /// Stop painting after the current send.
    Pause,

    /// Continue painting.
    Resume,

    /// Cancel one job or everything.
    Cancel {
        target: CancelTarget,
        reply: RpcReplyPort<DrawResult<()>>,
    },

    /// Progress of a single job.
    Status {
        job_id: JobId,
        reply: RpcReplyPort<Option<JobStatus>>,
    },

    /// Progress of every live job.
    List { reply: RpcReplyPort<Vec<JobStatus>> },

    /// Perform one send.
    Step,

    /// Periodic discovery of persisted jobs.
    Tick,

    /// Checkpoint and stop.
    Shutdown { reply: RpcReplyPort<()> },
}

/// Messages for the GuardActor.
#[derive(Debug)]
pub enum GuardMessage {
    /// A write seen on the canvas.
    Observe(CanvasWrite),

    /// Turn corrections on or off.
    SetEnabled(bool),

    /// Start protecting a new reference image.
    Protect { reference: Box<ReferenceImage> },

    /// Stop protecting anything.
    Clear,

    /// Diff the reference against what has been observed.
    Mismatch {
        filter: Option<Rgb>,
        reply: RpcReplyPort<MismatchReport>,
    },
}
