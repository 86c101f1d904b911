//! Actor system for the canvas scheduler.
//!
//! This crate provides the Ractor-based actors that paint queued jobs onto
//! an external canvas and defend a reference image against overwrites.
//!
//! # Architecture
//!
//! - `SchedulerActor` - Owns the job collection and sends one pixel per step
//! - `GuardActor` - Watches inbound canvas writes and corrects protected pixels
//! - `Canvas` - Facade wiring both actors to persistence and an image source
//!
//! The two actors share nothing but the [`CommandChannel`].
//!
//! # Usage
//!
//! ```ignore
//! use actors::{Canvas, CanvasConfig, FileSource, JobStore};
//!
//! let store = JobStore::memory().await?;
//! let canvas = Canvas::start(CanvasConfig::default(), store, channel, Arc::new(FileSource::new())).await?;
//! let job_id = canvas.draw_image("cat.png", Placement::at(10, 10), &["center"]).await?;
//! ```

mod canvas;
mod channel;
mod guard;
mod messages;
mod persistence;
mod scheduler;
mod scheduler_actor;
mod source;

pub use canvas::{Canvas, CanvasConfig};
pub use channel::{CommandChannel, SendFuture, SharedChannel, write_stream};
pub use guard::{
    ConsistencyGuard, GuardActor, GuardArgs, Mismatch, MismatchReport, ReferenceImage, start_guard,
};
pub use messages::{GuardMessage, SchedulerMessage};
pub use persistence::{JobStore, PersistenceError, QueueBlob, TEXT_COLUMN_KEY, TEXT_LINE_KEY};
pub use scheduler::{CancelTarget, SchedulerConfig, SchedulerState, StepOutcome};
pub use scheduler_actor::{SchedulerActor, SchedulerArgs, start_scheduler};
pub use source::{AutoSource, FetchFuture, FileSource, HttpSource, ImageSource};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, concurrency};
