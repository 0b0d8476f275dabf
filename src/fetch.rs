//! Byte fetching.
//!
//! The [`ByteFetcher`] trait is the seam between the pipeline and the
//! outside world: everything downstream only ever sees a [`Blob`]. The
//! production implementation is [`HttpFetcher`]:
//!
//! | URL form | Transport |
//! |---|---|
//! | `http://`, `https://` | `ureq` on the blocking pool |
//! | `file://path`, plain path | `tokio::fs::read` |
//!
//! There is no retry and no cache. Fetching the same URL twice hits the
//! transport twice; a caching layer, if wanted, wraps a fetcher from outside.

use crate::config::FetchConfig;
use async_trait::async_trait;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("fetch task failed: {0}")]
    Task(String),
}

/// Raw bytes of one fetched image.
///
/// Cheap to clone, so the metadata reader and the decoder can each hold it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    bytes: Arc<[u8]>,
}

impl Blob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::from(bytes),
        }
    }
}

/// Retrieves the raw bytes behind a URL.
#[async_trait]
pub trait ByteFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Blob, FetchError>;
}

/// Fetcher for remote (`http`/`https`) and local (`file://` or path) URLs.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(Duration::from_secs(config.timeout_secs))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

pub(crate) fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn local_path(url: &str) -> &Path {
    Path::new(url.strip_prefix("file://").unwrap_or(url))
}

fn fetch_remote(agent: &ureq::Agent, url: &str) -> Result<Blob, FetchError> {
    let response = agent.get(url).call().map_err(|e| match e {
        ureq::Error::Status(code, _) => FetchError::Status(code),
        ureq::Error::Transport(t) => FetchError::Transport(t.to_string()),
    })?;
    let mut buf = Vec::new();
    response.into_reader().read_to_end(&mut buf)?;
    Ok(Blob::from(buf))
}

#[async_trait]
impl ByteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Blob, FetchError> {
        let blob = if is_remote(url) {
            let agent = self.agent.clone();
            let owned = url.to_string();
            // ureq is blocking; keep it off the async workers
            tokio::task::spawn_blocking(move || fetch_remote(&agent, &owned))
                .await
                .map_err(|e| FetchError::Task(e.to_string()))??
        } else {
            Blob::from(tokio::fs::read(local_path(url)).await?)
        };
        tracing::debug!(url, bytes = blob.len(), "fetched");
        Ok(blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://example.com/a.jpg"));
        assert!(is_remote("http://example.com/a.jpg"));
        assert!(!is_remote("file:///tmp/a.jpg"));
        assert!(!is_remote("images/a.jpg"));
    }

    #[test]
    fn file_scheme_is_stripped() {
        assert_eq!(local_path("file:///tmp/a.jpg"), Path::new("/tmp/a.jpg"));
        assert_eq!(local_path("images/a.jpg"), Path::new("images/a.jpg"));
    }

    #[test]
    fn blob_clones_share_bytes() {
        let blob = Blob::from(vec![1, 2, 3]);
        let copy = blob.clone();
        assert_eq!(copy.as_bytes(), &[1, 2, 3]);
        assert_eq!(blob.len(), 3);
        assert!(!blob.is_empty());
    }

    #[tokio::test]
    async fn reads_local_path_and_file_url() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.jpg");
        std::fs::write(&path, b"bytes").unwrap();
        let fetcher = HttpFetcher::default();

        let plain = fetcher.fetch(path.to_str().unwrap()).await.unwrap();
        assert_eq!(plain.as_bytes(), b"bytes");

        let url = format!("file://{}", path.display());
        let via_scheme = fetcher.fetch(&url).await.unwrap();
        assert_eq!(via_scheme, plain);
    }

    #[tokio::test]
    async fn missing_local_file_is_io_error() {
        let fetcher = HttpFetcher::default();
        let err = fetcher.fetch("/nonexistent/photo.jpg").await.unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
    }
}
