//! Audio download with retry
//!
//! Every attempt starts from a clean slate: the channel directory is created
//! and any partial file left by an earlier attempt is removed before the
//! source is asked for the audio again.

use crate::config::RetryConfig;
use crate::error::DownloadError;
use crate::retry::{IsRetryable, with_retry};
use crate::source::VideoSource;
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Downloads audio containers through a [`VideoSource`]
pub struct AudioDownloader {
    source: Arc<dyn VideoSource>,
    retry: RetryConfig,
}

impl AudioDownloader {
    /// Create a downloader with the given retry budget
    pub fn new(source: Arc<dyn VideoSource>, retry: RetryConfig) -> Self {
        Self { source, retry }
    }

    /// Download the audio of `source_url` to exactly `dest`
    ///
    /// Makes one attempt plus up to `retry.max_attempts` retries.
    ///
    /// # Errors
    ///
    /// [`DownloadError::RetriesExhausted`] carrying the last attempt's failure.
    pub async fn download(&self, dest: &Path, source_url: &str) -> Result<()> {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;

        let result = with_retry(&self.retry, move || {
            counter.fetch_add(1, Ordering::Relaxed);
            async move { self.attempt(dest, source_url).await.map_err(FailedAttempt) }
        })
        .await;

        result.map_err(|FailedAttempt(cause)| {
            Error::Download(DownloadError::RetriesExhausted {
                url: source_url.to_string(),
                attempts: attempts.load(Ordering::Relaxed),
                cause: Box::new(cause),
            })
        })?;

        tracing::debug!(url = source_url, dest = %dest.display(), source = self.source.name(), "Audio downloaded");
        Ok(())
    }

    async fn attempt(&self, dest: &Path, source_url: &str) -> Result<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        match tokio::fs::remove_file(dest).await {
            Ok(()) => tracing::debug!(dest = %dest.display(), "Removed leftover file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        self.source.download_audio(source_url, dest).await
    }
}

/// Failure of one download attempt
///
/// Whatever went wrong, the attempt counts against the budget and the next
/// one starts from a clean slate.
struct FailedAttempt(Error);

impl IsRetryable for FailedAttempt {
    fn is_retryable(&self) -> bool {
        true
    }
}

impl std::fmt::Display for FailedAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
