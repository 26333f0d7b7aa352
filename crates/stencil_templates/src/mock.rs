//! Mock transport for testing.
//!
//! Serves a fixed archive and metadata document from memory and counts every
//! request, so callers can verify caching behavior without network access.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{TemplateError, TemplateResult};
use crate::transport::{ArchiveTransport, MetadataReply};

/// In-memory transport for tests.
#[derive(Clone)]
pub struct MockTransport {
    /// Bytes returned for every archive download.
    archive: Arc<RwLock<Vec<u8>>>,
    /// Status returned for archive downloads.
    archive_status: Arc<RwLock<u16>>,
    /// Reply returned for metadata requests.
    metadata: Arc<RwLock<MetadataReply>>,
    downloads: Arc<AtomicUsize>,
    metadata_requests: Arc<AtomicUsize>,
    /// Every requested URL, in order.
    requested_urls: Arc<RwLock<Vec<String>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a mock serving an empty archive and a 404 for metadata.
    pub fn new() -> Self {
        Self {
            archive: Arc::new(RwLock::new(Vec::new())),
            archive_status: Arc::new(RwLock::new(200)),
            metadata: Arc::new(RwLock::new(MetadataReply {
                status: 404,
                body: String::new(),
            })),
            downloads: Arc::new(AtomicUsize::new(0)),
            metadata_requests: Arc::new(AtomicUsize::new(0)),
            requested_urls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Serve these bytes as the archive.
    pub fn with_archive(self, bytes: Vec<u8>) -> Self {
        *self.archive.write() = bytes;
        self
    }

    /// Fail archive downloads with this status.
    pub fn with_archive_status(self, status: u16) -> Self {
        *self.archive_status.write() = status;
        self
    }

    /// Answer metadata requests with a repository whose default branch is `branch`.
    pub fn with_default_branch(self, branch: &str) -> Self {
        *self.metadata.write() = MetadataReply {
            status: 200,
            body: serde_json::json!({ "default_branch": branch }).to_string(),
        };
        self
    }

    /// Answer metadata requests with a bare status.
    pub fn with_metadata_status(self, status: u16) -> Self {
        *self.metadata.write() = MetadataReply {
            status,
            body: String::new(),
        };
        self
    }

    /// Number of archive downloads so far.
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    /// Number of metadata requests so far.
    pub fn metadata_count(&self) -> usize {
        self.metadata_requests.load(Ordering::SeqCst)
    }

    /// All requested URLs.
    pub fn requested_urls(&self) -> Vec<String> {
        self.requested_urls.read().clone()
    }
}

#[async_trait]
impl ArchiveTransport for MockTransport {
    async fn get_metadata(&self, url: &str) -> TemplateResult<MetadataReply> {
        self.metadata_requests.fetch_add(1, Ordering::SeqCst);
        self.requested_urls.write().push(url.to_string());
        Ok(self.metadata.read().clone())
    }

    async fn download(&self, url: &str, dest: &Path) -> TemplateResult<u64> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.requested_urls.write().push(url.to_string());

        let status = *self.archive_status.read();
        if !(200..300).contains(&status) {
            return Err(TemplateError::Download {
                url: url.to_string(),
                status,
            });
        }

        let bytes = self.archive.read().clone();
        tokio::fs::write(dest, &bytes).await?;
        Ok(bytes.len() as u64)
    }
}
