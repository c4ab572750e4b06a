//! Image download over HTTP

use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

const FETCH_TIMEOUT_SECS: u64 = 30;

/// Fetches image bytes by URL
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Download the whole resource into memory
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`ImageFetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    /// Create a fetcher with a 30 second timeout
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .user_agent(concat!("yt-smpl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        tracing::debug!(url, bytes = bytes.len(), "Image fetched");
        Ok(bytes.to_vec())
    }
}
