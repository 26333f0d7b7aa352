//! Network access for remote templates.

use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{TemplateError, TemplateResult};

/// Status and body of a metadata request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataReply {
    pub status: u16,
    pub body: String,
}

/// Transport used by the remote archive fetcher.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArchiveTransport: Send + Sync {
    /// GET a metadata document. Non-success statuses are returned, not raised.
    async fn get_metadata(&self, url: &str) -> TemplateResult<MetadataReply>;

    /// Stream the archive at `url` into the file at `dest`, returning bytes written.
    async fn download(&self, url: &str, dest: &Path) -> TemplateResult<u64>;
}

/// HTTP transport backed by reqwest. Single attempt, transport-default timeouts.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(provider: &ProviderConfig) -> TemplateResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(provider.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArchiveTransport for HttpTransport {
    async fn get_metadata(&self, url: &str) -> TemplateResult<MetadataReply> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(MetadataReply { status, body })
    }

    async fn download(&self, url: &str, dest: &Path) -> TemplateResult<u64> {
        debug!("Downloading {} to {:?}", url, dest);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(TemplateError::Download {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}
