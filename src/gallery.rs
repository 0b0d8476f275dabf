//! Presentation sequence: a manifest of requests loaded into an ordered,
//! navigable gallery.
//!
//! ## Manifest
//!
//! A JSON array of [`ImageRequest`]s:
//!
//! ```json
//! [
//!   { "image": "photos/harbour.jpg", "height": 2.0 },
//!   { "image": "https://example.com/pano.jpg" },
//!   { "image": { "left": "l.jpg", "right": "r.jpg" }, "width": 3.0 }
//! ]
//! ```
//!
//! Relative local paths are resolved against the manifest's directory.
//!
//! ## Loading
//!
//! Every entry is loaded on its own task. Entries that give neither width
//! nor height get `gallery.default_height`. The first failing entry fails
//! the whole gallery and the remaining tasks are aborted. Results keep
//! manifest order regardless of completion order.

use crate::config::LoaderConfig;
use crate::fetch::{ByteFetcher, is_remote};
use crate::load::{LoadError, load_with_fetcher};
use crate::types::{ImageRequest, ImageSource, LoadResult};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("manifest parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("entry {index}: {source}")]
    Load {
        index: usize,
        #[source]
        source: LoadError,
    },
    #[error("load task failed: {0}")]
    Task(String),
}

/// Read a gallery manifest, resolving relative local paths against its directory.
pub fn read_manifest(path: &Path) -> Result<Vec<ImageRequest>, GalleryError> {
    let content = std::fs::read_to_string(path)?;
    let mut requests: Vec<ImageRequest> = serde_json::from_str(&content)?;
    if let Some(base) = path.parent() {
        for request in &mut requests {
            resolve_source(&mut request.image, base);
        }
    }
    Ok(requests)
}

fn resolve_source(source: &mut ImageSource, base: &Path) {
    match source {
        ImageSource::Mono(url) => resolve_url(url, base),
        ImageSource::Stereo { left, right } => {
            resolve_url(left, base);
            resolve_url(right, base);
        }
    }
}

fn resolve_url(url: &mut String, base: &Path) {
    if is_remote(url) || url.starts_with("file://") || Path::new(url.as_str()).is_absolute() {
        return;
    }
    *url = base.join(url.as_str()).to_string_lossy().into_owned();
}

/// Give size-less entries the configured default height.
pub fn apply_default_height(request: &mut ImageRequest, default_height: f64) {
    if request.requested_size().is_empty() {
        request.height = Some(default_height);
    }
}

/// Load every request concurrently into a [`Gallery`] in manifest order.
pub async fn load_gallery<F>(
    fetcher: Arc<F>,
    requests: Vec<ImageRequest>,
    config: &LoaderConfig,
) -> Result<Gallery, GalleryError>
where
    F: ByteFetcher + 'static,
{
    let total = requests.len();
    let mut set = JoinSet::new();

    for (index, mut request) in requests.into_iter().enumerate() {
        apply_default_height(&mut request, config.gallery.default_height);
        let fetcher = Arc::clone(&fetcher);
        let config = config.clone();
        set.spawn(async move {
            let result = load_with_fetcher(fetcher.as_ref(), &request, &config).await;
            (index, result)
        });
    }

    let mut slots: Vec<Option<LoadResult>> = (0..total).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        let (index, result) = joined.map_err(|e| GalleryError::Task(e.to_string()))?;
        match result {
            Ok(loaded) => slots[index] = Some(loaded),
            Err(source) => {
                set.abort_all();
                return Err(GalleryError::Load { index, source });
            }
        }
    }

    let entries = slots.into_iter().flatten().collect();
    Ok(Gallery::new(entries))
}

/// Loaded entries with a wrapping cursor.
#[derive(Debug)]
pub struct Gallery {
    entries: Vec<LoadResult>,
    index: usize,
}

impl Gallery {
    pub fn new(entries: Vec<LoadResult>) -> Self {
        Self { entries, index: 0 }
    }

    pub fn entries(&self) -> &[LoadResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor position, `None` when the gallery is empty.
    pub fn position(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.index)
    }

    pub fn current(&self) -> Option<&LoadResult> {
        self.entries.get(self.index)
    }

    pub fn next(&mut self) -> Option<&LoadResult> {
        if self.entries.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.entries.len();
        self.current()
    }

    pub fn previous(&mut self) -> Option<&LoadResult> {
        if self.entries.is_empty() {
            return None;
        }
        self.index = (self.index + self.entries.len() - 1) % self.entries.len();
        self.current()
    }
}
