//! Image sources: turn a reference (path or URL) into raw bytes.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use canvas_core::{DrawError, DrawResult};

/// Future type for async fetches.
pub type FetchFuture = Pin<Box<dyn Future<Output = DrawResult<Bytes>> + Send>>;

/// Supplies raw image bytes for a reference.
///
/// Failures surface as [`DrawError::Fetch`] and reject the draw request.
pub trait ImageSource: Send + Sync + 'static {
    fn fetch(&self, reference: &str) -> FetchFuture;
}

/// Reads images from the local filesystem, optionally below a root.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    root: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, reference: &str) -> PathBuf {
        let reference = reference.strip_prefix("file://").unwrap_or(reference);
        match &self.root {
            Some(root) => root.join(reference),
            None => PathBuf::from(reference),
        }
    }
}

impl ImageSource for FileSource {
    fn fetch(&self, reference: &str) -> FetchFuture {
        let path = self.resolve(reference);
        Box::pin(async move {
            let data = tokio::fs::read(&path)
                .await
                .map_err(|e| DrawError::Fetch(format!("{}: {}", path.display(), e)))?;
            Ok(Bytes::from(data))
        })
    }
}

/// Downloads images over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> DrawResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DrawError::Fetch(e.to_string()))?;
        Ok(Self { client })
    }
}

impl ImageSource for HttpSource {
    fn fetch(&self, reference: &str) -> FetchFuture {
        let client = self.client.clone();
        let url = reference.to_string();
        Box::pin(async move {
            tracing::debug!("Fetching image from {}", url);
            let response = client
                .get(&url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| DrawError::Fetch(e.to_string()))?;
            response
                .bytes()
                .await
                .map_err(|e| DrawError::Fetch(e.to_string()))
        })
    }
}

/// Routes `http(s)://` references to HTTP and everything else to files.
#[derive(Clone)]
pub struct AutoSource {
    files: FileSource,
    http: Arc<HttpSource>,
}

impl AutoSource {
    pub fn new(files: FileSource, http: HttpSource) -> Self {
        Self {
            files,
            http: Arc::new(http),
        }
    }
}

impl ImageSource for AutoSource {
    fn fetch(&self, reference: &str) -> FetchFuture {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            self.http.fetch(reference)
        } else {
            self.files.fetch(reference)
        }
    }
}
