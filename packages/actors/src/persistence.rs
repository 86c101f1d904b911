//! Durable job state: one queue blob per job plus small checkpoint scalars.

use canvas_core::{BoundingBox, DrawError, Job, JobId, PaintOp};
use db::{ConfigStore, DbConfig, DbError};
use serde::{Deserialize, Serialize};
use storage::{Storage, StorageConfig, StorageError};

const QUEUE_DIR: &str = "jobs";

/// Config key holding the renderer line.
pub const TEXT_LINE_KEY: &str = "TextLine";
/// Config key holding the renderer column.
pub const TEXT_COLUMN_KEY: &str = "TextColumn";

/// Contents of a job's queue file, written once at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueBlob {
    pub ops: Vec<PaintOp>,
    pub bounds: BoundingBox,
}

/// Blob storage for queues, key/value store for checkpoints.
///
/// Blobs are never rewritten mid-flight; only the `Start_<id>` checkpoint
/// moves while a job runs.
#[derive(Clone)]
pub struct JobStore {
    blobs: Storage,
    config: ConfigStore,
}

impl JobStore {
    pub fn new(blobs: Storage, config: ConfigStore) -> Self {
        Self { blobs, config }
    }

    /// Open both backends from their configs.
    pub async fn open(storage: StorageConfig, db: &DbConfig) -> Result<Self, PersistenceError> {
        let blobs = Storage::new(storage).await?;
        let config = ConfigStore::open(db).await?;
        tracing::info!(
            "Job store ready ({} queues, checkpoints at {})",
            blobs.kind().as_str(),
            db.endpoint
        );
        Ok(Self::new(blobs, config))
    }

    /// In-memory store for tests and throwaway canvases.
    pub async fn memory() -> Result<Self, PersistenceError> {
        Self::open(StorageConfig::memory(), &DbConfig::memory()).await
    }

    pub fn start_key(id: &JobId) -> String {
        format!("Start_{id}")
    }

    pub fn end_key(id: &JobId) -> String {
        format!("End_{id}")
    }

    fn queue_key(id: &JobId) -> String {
        format!("{QUEUE_DIR}/{id}.json")
    }

    pub async fn save_queue(&self, id: &JobId, blob: &QueueBlob) -> Result<(), PersistenceError> {
        self.blobs.put_json(&Self::queue_key(id), blob).await?;
        tracing::debug!("Saved queue for job {} ({} ops)", id, blob.ops.len());
        Ok(())
    }

    /// Load a queue file; a missing file is `None`.
    pub async fn load_queue(&self, id: &JobId) -> Result<Option<QueueBlob>, PersistenceError> {
        match self.blobs.get_json(&Self::queue_key(id)).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_queue(&self, id: &JobId) -> Result<(), PersistenceError> {
        self.blobs.delete(&Self::queue_key(id)).await?;
        Ok(())
    }

    /// Ids of every persisted queue, in id order.
    pub async fn list_queues(&self) -> Result<Vec<JobId>, PersistenceError> {
        let names = self.blobs.list(QUEUE_DIR).await?;
        let mut ids: Vec<JobId> = names
            .iter()
            .filter_map(|name| name.strip_suffix(".json"))
            .filter_map(JobId::parse)
            .collect();
        ids.sort();
        Ok(ids)
    }

    pub async fn get_checkpoint(&self, key: &str) -> Result<Option<i64>, PersistenceError> {
        Ok(self.config.get(key).await?)
    }

    pub async fn set_checkpoint(&self, key: &str, value: i64) -> Result<(), PersistenceError> {
        Ok(self.config.set(key, value).await?)
    }

    /// Remove every checkpoint whose key matches a `*` pattern.
    pub async fn delete_checkpoints(&self, pattern: &str) -> Result<usize, PersistenceError> {
        Ok(self.config.delete_matching(pattern).await?)
    }

    /// Persist a newly accepted job: queue file first, then its bounds.
    pub async fn register(&self, job: &Job) -> Result<(), PersistenceError> {
        let blob = QueueBlob {
            ops: job.queue.clone(),
            bounds: job.bounds,
        };
        self.save_queue(&job.id, &blob).await?;
        self.set_checkpoint(&Self::end_key(&job.id), job.total() as i64)
            .await?;
        if job.cursor > 0 {
            self.checkpoint(&job.id, job.cursor).await?;
        }
        Ok(())
    }

    /// Record a job's progress.
    pub async fn checkpoint(&self, id: &JobId, cursor: usize) -> Result<(), PersistenceError> {
        self.set_checkpoint(&Self::start_key(id), cursor as i64)
            .await
    }

    /// Rebuild a job from its queue file and checkpoints.
    ///
    /// Missing checkpoints default to the start of the queue and its full
    /// length. Returns `None` when the queue file is gone.
    pub async fn restore(&self, id: &JobId) -> Result<Option<Job>, PersistenceError> {
        let Some(blob) = self.load_queue(id).await? else {
            return Ok(None);
        };

        let len = blob.ops.len();
        let end = self
            .get_checkpoint(&Self::end_key(id))
            .await?
            .map_or(len, |end| clamp(end, len));
        let start = self
            .get_checkpoint(&Self::start_key(id))
            .await?
            .map_or(0, |start| clamp(start, end));

        let mut ops = blob.ops;
        ops.truncate(end);
        tracing::info!("Restored job {} at {}/{}", id, start, end);
        Ok(Some(Job::with_id(id.clone(), ops, start, blob.bounds)))
    }

    /// Erase everything durable about a job.
    pub async fn erase(&self, id: &JobId) -> Result<(), PersistenceError> {
        self.delete_queue(id).await?;
        let removed = self.delete_checkpoints(&format!("*_{id}")).await?;
        tracing::debug!("Erased job {} ({} checkpoint keys)", id, removed);
        Ok(())
    }
}

fn clamp(value: i64, max: usize) -> usize {
    usize::try_from(value).map_or(0, |v| v.min(max))
}

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("database error: {0}")]
    Db(#[from] DbError),
}

impl From<PersistenceError> for DrawError {
    fn from(e: PersistenceError) -> Self {
        DrawError::Persistence(e.to_string())
    }
}
