//! High-level handle over one canvas: scheduler, guard, persistence and
//! image source wired together.

use std::sync::Arc;

use canvas_core::{DrawError, DrawResult, Job, JobId, JobStatus, Rgb};
use image::DynamicImage;
use image::imageops::FilterType;
use ractor::{ActorRef, RpcReplyPort};
use raster::{Pipeline, Placement, Plan, TextCursor, TextGrid, decode, plan_image, plan_text};
use tokio::sync::Mutex;

use crate::channel::SharedChannel;
use crate::guard::{GuardArgs, MismatchReport, ReferenceImage, start_guard};
use crate::messages::{GuardMessage, SchedulerMessage};
use crate::persistence::{JobStore, TEXT_COLUMN_KEY, TEXT_LINE_KEY};
use crate::scheduler::{CancelTarget, SchedulerConfig};
use crate::scheduler_actor::{SchedulerArgs, start_scheduler};
use crate::source::ImageSource;

/// Canvas configuration.
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    pub scheduler: SchedulerConfig,
    pub text_grid: TextGrid,
    /// Canvas position of the text grid's top-left corner.
    pub text_origin: (i64, i64),
    /// Whether the guard starts enabled.
    pub guard_enabled: bool,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            text_grid: TextGrid::default(),
            text_origin: (0, 0),
            guard_enabled: true,
        }
    }
}

impl CanvasConfig {
    pub fn from_env() -> Self {
        Self {
            scheduler: SchedulerConfig::from_env(),
            ..Self::default()
        }
    }
}

/// A running canvas.
pub struct Canvas {
    scheduler: ActorRef<SchedulerMessage>,
    guard: ActorRef<GuardMessage>,
    handles: Vec<tokio::task::JoinHandle<()>>,
    store: JobStore,
    source: Arc<dyn ImageSource>,
    text_grid: TextGrid,
    text_origin: (i64, i64),
    /// Serializes text submissions so the persisted cursor never races.
    text_lock: Mutex<()>,
}

impl Canvas {
    /// Spawn the scheduler and guard actors for one canvas.
    pub async fn start(
        config: CanvasConfig,
        store: JobStore,
        channel: SharedChannel,
        source: Arc<dyn ImageSource>,
    ) -> DrawResult<Self> {
        let (scheduler, scheduler_handle) = start_scheduler(SchedulerArgs {
            config: config.scheduler,
            store: store.clone(),
            channel: channel.clone(),
        })
        .await
        .map_err(|e| DrawError::Unavailable(format!("Failed to spawn scheduler: {e}")))?;

        let (guard, guard_handle) = start_guard(GuardArgs {
            enabled: config.guard_enabled,
            channel,
        })
        .await
        .map_err(|e| DrawError::Unavailable(format!("Failed to spawn guard: {e}")))?;

        Ok(Self {
            scheduler,
            guard,
            handles: vec![scheduler_handle, guard_handle],
            store,
            source,
            text_grid: config.text_grid,
            text_origin: config.text_origin,
            text_lock: Mutex::new(()),
        })
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    async fn fetch_image(&self, reference: &str) -> DrawResult<DynamicImage> {
        let bytes = self.source.fetch(reference).await?;
        decode(&bytes)
    }

    /// Fetch, decompose, order and queue an image.
    pub async fn draw_image(
        &self,
        reference: &str,
        placement: Placement,
        modifiers: &[&str],
    ) -> DrawResult<JobId> {
        let pipeline = Pipeline::parse(modifiers.iter().copied())?;
        let image = self.fetch_image(reference).await?;
        self.draw_decoded(&image, placement, &pipeline).await
    }

    /// Queue an already decoded image.
    pub async fn draw_decoded(
        &self,
        image: &DynamicImage,
        placement: Placement,
        pipeline: &Pipeline,
    ) -> DrawResult<JobId> {
        let plan = plan_image(image, &placement, pipeline)?;
        tracing::info!(
            "Planned {} ops at {} (cursor {})",
            plan.ops.len(),
            plan.bounds,
            plan.cursor
        );
        self.submit_plan(plan).await
    }

    /// Render a chat line at the persisted text cursor and queue it.
    ///
    /// The advanced cursor is stored before the job is queued and put back
    /// if queuing fails, so an error never leaves a job behind.
    pub async fn draw_text(&self, text: &str) -> DrawResult<JobId> {
        let _text = self.text_lock.lock().await;

        let cursor = self.text_cursor().await?;
        let (plan, next) = plan_text(&self.text_grid, text, cursor, self.text_origin)?;

        if let Err(e) = self.save_text_cursor(next).await {
            self.restore_text_cursor(cursor).await;
            return Err(e);
        }
        match self.submit_plan(plan).await {
            Ok(id) => Ok(id),
            Err(e) => {
                self.restore_text_cursor(cursor).await;
                Err(e)
            }
        }
    }

    async fn save_text_cursor(&self, cursor: TextCursor) -> DrawResult<()> {
        self.store
            .set_checkpoint(TEXT_LINE_KEY, i64::from(cursor.line))
            .await?;
        self.store
            .set_checkpoint(TEXT_COLUMN_KEY, i64::from(cursor.column))
            .await?;
        Ok(())
    }

    async fn restore_text_cursor(&self, cursor: TextCursor) {
        if let Err(e) = self.save_text_cursor(cursor).await {
            tracing::warn!("Failed to restore text cursor to {:?}: {}", cursor, e);
        }
    }

    /// Where the next chat line will start.
    pub async fn text_cursor(&self) -> DrawResult<TextCursor> {
        let read = |value: Option<i64>| value.and_then(|v| u32::try_from(v).ok()).unwrap_or(0);
        let line = read(self.store.get_checkpoint(TEXT_LINE_KEY).await?);
        let column = read(self.store.get_checkpoint(TEXT_COLUMN_KEY).await?);
        Ok(TextCursor::new(line, column))
    }

    pub async fn submit_plan(&self, plan: Plan) -> DrawResult<JobId> {
        self.submit(plan.into_job()).await
    }

    pub async fn submit(&self, job: Job) -> DrawResult<JobId> {
        ask(&self.scheduler, |reply| SchedulerMessage::Submit {
            job: Box::new(job),
            reply,
        })
        .await?
    }

    pub fn pause(&self) -> DrawResult<()> {
        tell(&self.scheduler, SchedulerMessage::Pause)
    }

    pub fn resume(&self) -> DrawResult<()> {
        tell(&self.scheduler, SchedulerMessage::Resume)
    }

    pub async fn cancel(&self, target: CancelTarget) -> DrawResult<()> {
        ask(&self.scheduler, |reply| SchedulerMessage::Cancel { target, reply }).await?
    }

    pub async fn progress(&self, job_id: &JobId) -> DrawResult<Option<JobStatus>> {
        let job_id = job_id.clone();
        ask(&self.scheduler, |reply| SchedulerMessage::Status { job_id, reply }).await
    }

    pub async fn list(&self) -> DrawResult<Vec<JobStatus>> {
        ask(&self.scheduler, |reply| SchedulerMessage::List { reply }).await
    }

    /// Turn the consistency guard on or off.
    pub fn set_guard(&self, enabled: bool) -> DrawResult<()> {
        tell(&self.guard, GuardMessage::SetEnabled(enabled))
    }

    /// Fetch an image and protect it at `placement`.
    pub async fn protect(&self, reference: &str, placement: Placement) -> DrawResult<()> {
        let image = self.fetch_image(reference).await?;
        self.protect_decoded(&image, placement)
    }

    pub fn protect_decoded(&self, image: &DynamicImage, placement: Placement) -> DrawResult<()> {
        let image = match placement.size {
            Some((0, _)) | Some((_, 0)) => return Err(DrawError::EmptyImage),
            Some((width, height)) => image.resize_exact(width, height, FilterType::Nearest),
            None => image.clone(),
        };
        let reference = ReferenceImage::from_dynamic((placement.x, placement.y), &image);
        tell(
            &self.guard,
            GuardMessage::Protect {
                reference: Box::new(reference),
            },
        )
    }

    pub fn unprotect(&self) -> DrawResult<()> {
        tell(&self.guard, GuardMessage::Clear)
    }

    /// One-shot diff of the protected image against observed writes.
    pub async fn mismatch(&self, filter: Option<Rgb>) -> DrawResult<MismatchReport> {
        ask(&self.guard, |reply| GuardMessage::Mismatch { filter, reply }).await
    }

    /// Checkpoint the active job and stop both actors.
    pub async fn shutdown(self) -> DrawResult<()> {
        ask(&self.scheduler, |reply| SchedulerMessage::Shutdown { reply }).await?;
        self.guard.stop(None);
        for handle in self.handles {
            let _ = handle.await;
        }
        tracing::info!("Canvas stopped");
        Ok(())
    }
}

fn tell<M: ractor::Message>(actor: &ActorRef<M>, message: M) -> DrawResult<()> {
    actor
        .send_message(message)
        .map_err(|e| DrawError::Unavailable(e.to_string()))
}

async fn ask<M, T>(actor: &ActorRef<M>, build: impl FnOnce(RpcReplyPort<T>) -> M) -> DrawResult<T>
where
    M: ractor::Message,
    T: Send + 'static,
{
    let (tx, rx) = ractor::concurrency::oneshot();
    tell(actor, build(tx.into()))?;
    rx.await
        .map_err(|_| DrawError::Unavailable("actor dropped the reply".to_string()))
}
