#![allow(dead_code)]

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actors::{CommandChannel, JobStore, SendFuture, SharedChannel, write_stream};
use canvas_core::{CanvasWrite, Job, JobId, Notice, PaintOp, Rgb, SendFailure, SendOrigin};
use futures_util::stream::BoxStream;
use image::{DynamicImage, Rgba, RgbaImage};
use raster::{Pipeline, Placement, plan_image};
use tokio::sync::broadcast;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub const RED: Rgb = Rgb::new(255, 0, 0);
pub const BLUE: Rgb = Rgb::new(0, 0, 255);

/// Records every send; fails the attempts listed in `failing` (1-based).
pub struct MockChannel {
    attempts: AtomicUsize,
    failing: HashSet<usize>,
    sends: Mutex<Vec<(PaintOp, SendOrigin)>>,
    notices: Mutex<Vec<Notice>>,
    inbound: broadcast::Sender<CanvasWrite>,
}

impl MockChannel {
    pub fn new() -> Arc<Self> {
        Self::failing_on([])
    }

    pub fn failing_on(attempts: impl IntoIterator<Item = usize>) -> Arc<Self> {
        let (inbound, _) = broadcast::channel(256);
        Arc::new(Self {
            attempts: AtomicUsize::new(0),
            failing: attempts.into_iter().collect(),
            sends: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
            inbound,
        })
    }

    pub fn shared(self: &Arc<Self>) -> SharedChannel {
        self.clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn sends(&self) -> Vec<(PaintOp, SendOrigin)> {
        self.sends.lock().unwrap().clone()
    }

    pub fn job_sends(&self, id: &JobId) -> Vec<PaintOp> {
        self.sends()
            .into_iter()
            .filter(|(_, origin)| origin == &SendOrigin::Job(id.clone()))
            .map(|(op, _)| op)
            .collect()
    }

    pub fn guard_sends(&self) -> Vec<PaintOp> {
        self.sends()
            .into_iter()
            .filter(|(_, origin)| origin == &SendOrigin::Guard)
            .map(|(op, _)| op)
            .collect()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    /// Simulate a write by someone else.
    pub fn emit(&self, x: i64, y: i64, color: Rgb, actor: &str) {
        let _ = self.inbound.send(CanvasWrite {
            x,
            y,
            color,
            actor: actor.to_string(),
        });
    }
}

impl CommandChannel for MockChannel {
    fn send(&self, op: PaintOp, origin: SendOrigin) -> SendFuture {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let result = if self.failing.contains(&attempt) {
            Err(SendFailure::new(format!("attempt {attempt} refused")))
        } else {
            self.sends.lock().unwrap().push((op, origin));
            Ok(())
        };
        Box::pin(std::future::ready(result))
    }

    fn announce(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }

    fn subscribe(&self) -> BoxStream<'static, CanvasWrite> {
        write_stream(self.inbound.subscribe())
    }
}

pub async fn setup_store() -> Result<JobStore, actors::PersistenceError> {
    JobStore::memory().await
}

pub fn solid(width: u32, height: u32, color: Rgb) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([color.r, color.g, color.b, 255]),
    ))
}

/// A fully opaque square at the origin, ordered by `modifiers`.
pub fn square_job(size: u32, modifiers: &[&str]) -> Job {
    let pipeline = Pipeline::parse(modifiers.iter().copied()).unwrap();
    plan_image(&solid(size, size, RED), &Placement::at(0, 0), &pipeline)
        .unwrap()
        .into_job()
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
