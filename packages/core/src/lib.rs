//! Core domain types for the canvas drawing scheduler.
//!
//! This crate contains shared types used across all packages:
//! - Rgb, PaintOp and BoundingBox for pixel work
//! - Job, JobState and JobStatus for resumable batches
//! - Channel traffic (writes observed, send origins, notices)
//! - The error taxonomy

mod color;
mod error;
mod events;
mod job;
mod op;

pub use color::Rgb;
pub use error::{DrawError, DrawResult, SendFailure};
pub use events::{CanvasWrite, Notice, SendOrigin};
pub use job::{Job, JobId, JobState, JobStatus};
pub use op::{BoundingBox, PaintOp};
