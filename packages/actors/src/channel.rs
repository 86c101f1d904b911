//! The command channel: the only path to and from the external canvas.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use canvas_core::{CanvasWrite, Notice, PaintOp, SendFailure, SendOrigin};
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use tokio::sync::broadcast;

/// Future returned by [`CommandChannel::send`].
pub type SendFuture = Pin<Box<dyn Future<Output = Result<(), SendFailure>> + Send>>;

/// Shared handle used by both the scheduler and the guard.
pub type SharedChannel = Arc<dyn CommandChannel>;

/// Fallible, one-pixel-per-call protocol to the canvas service.
///
/// Implementations must be cheap to call concurrently: the scheduler and
/// the guard hold the same channel and never coordinate with each other.
pub trait CommandChannel: Send + Sync + 'static {
    /// Paint one pixel. No delivery guarantee; failures are retried by the caller.
    fn send(&self, op: PaintOp, origin: SendOrigin) -> SendFuture;

    /// Best-effort operational announcement.
    fn announce(&self, notice: Notice);

    /// Writes observed on the canvas, including our own.
    fn subscribe(&self) -> BoxStream<'static, CanvasWrite>;
}

/// Adapt a broadcast receiver into the stream returned by `subscribe`.
///
/// Lagging subscribers skip what they missed rather than ending.
pub fn write_stream(rx: broadcast::Receiver<CanvasWrite>) -> BoxStream<'static, CanvasWrite> {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(write) => return Some((write, rx)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Dropped {} canvas writes", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .boxed()
}
