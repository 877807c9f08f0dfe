//! Remote fetching of media payloads

use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, warn};

/// Transport that downloads the bytes behind a locator.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    /// Downloads the full payload. Non-success responses are errors.
    async fn fetch(&self, locator: &str) -> anyhow::Result<Bytes>;
}

/// HTTP(S) fetcher backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, locator: &str) -> anyhow::Result<Bytes> {
        debug!(url = %locator, "Fetching media");

        let response = self
            .client
            .get(locator)
            .send()
            .await
            .with_context(|| format!("request to {} failed", locator))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, url = %locator, "Origin returned non-success status");
            bail!("origin returned status {}", status);
        }

        let data = response
            .bytes()
            .await
            .with_context(|| format!("reading body of {}", locator))?;

        debug!(url = %locator, size = data.len(), "Fetched media");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_unreachable_host() {
        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();

        // Port 9 (discard) on localhost is closed in test environments
        let result = fetcher.fetch("http://127.0.0.1:9/clip.mp4").await;
        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("127.0.0.1:9"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_unsupported_scheme() {
        let fetcher = HttpFetcher::with_client(Client::new());

        let result = fetcher.fetch("ftp://example.com/clip.mp4").await;
        assert!(result.is_err());
    }
}
