//! Error taxonomy shared by every package.

use crate::JobId;

/// Result type for draw submissions and control calls.
pub type DrawResult<T> = Result<T, DrawError>;

/// Errors reported synchronously to whoever submitted or controls a job.
///
/// None of these ever leave a partially created job behind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DrawError {
    #[error("image has no opaque pixels")]
    EmptyImage,

    #[error("invalid range: start {start}% end {end}% (expected 0 <= start <= end <= 100)")]
    InvalidRange { start: f64, end: f64 },

    #[error("invalid interleave: {generator} does not generate all residues mod {modulus}")]
    InvalidInterleave { generator: u64, modulus: u64 },

    #[error("failed to fetch image: {0}")]
    Fetch(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("job {0} already exists")]
    DuplicateJob(JobId),

    #[error("job not found: {0}")]
    JobNotFound(JobId),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("scheduler unavailable: {0}")]
    Unavailable(String),
}

/// A transient failure to deliver one operation. Retried in place.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("send failed: {0}")]
pub struct SendFailure(pub String);

impl SendFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}
