//! Attempt budgets with exponential backoff
//!
//! Both the download and conversion engines run their attempts through
//! [`with_retry`]. An attempt is repeated while its error reports
//! [`IsRetryable::is_retryable`] and the budget is not exhausted; the error of
//! the last attempt is returned unchanged so the caller can wrap it.
//!
//! # Example
//!
//! ```no_run
//! use yt_smpl::config::RetryConfig;
//! use yt_smpl::retry::with_retry;
//! use yt_smpl::Error;
//!
//! # async fn example() -> Result<(), Error> {
//! let config = RetryConfig::default();
//! let body = with_retry(&config, || async {
//!     Ok::<_, Error>("fetched".to_string())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{ConvertError, Error};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Classifies an error as worth another attempt or final
pub trait IsRetryable {
    /// Returns true if the operation should be attempted again
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Transient failures of a single attempt
            Error::Io(_) => true,
            Error::Network(_) => true,
            Error::ExternalTool(_) => true,
            Error::Convert(ConvertError::FileConversion { .. }) => true,
            // A stage that already exhausted its own budget is final
            Error::Convert(ConvertError::RetriesExhausted { .. }) => false,
            Error::Download(_) => false,
            // Rejected input never changes between attempts
            Error::InvalidInput(_) => false,
            Error::Config { .. } => false,
            Error::NotSupported(_) => false,
            // Catalog errors are not transient for a single-process SQLite file
            Error::Database(_) | Error::Sqlx(_) => false,
            Error::Artwork(_) => false,
            Error::Tagging { .. } => false,
            Error::Serialization(_) => false,
            Error::Other(_) => false,
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or runs out of budget
///
/// The operation runs once, then up to `config.max_attempts` more times while
/// it fails with a retryable error.
///
/// # Returns
///
/// The first success, or the error of the last attempt.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut retries = 0;
    let mut delay = config.initial_delay;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if retries > 0 {
                    tracing::info!(attempts = retries + 1, "Attempt succeeded after earlier failures");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !err.is_retryable() {
            tracing::error!(error = %err, "Attempt failed with a permanent error");
            return Err(err);
        }
        if retries >= config.max_attempts {
            tracing::error!(error = %err, attempts = retries + 1, "Retry budget exhausted");
            return Err(err);
        }

        retries += 1;
        tracing::warn!(
            error = %err,
            retry = retries,
            max_retries = config.max_attempts,
            delay_ms = delay.as_millis(),
            "Attempt failed, retrying"
        );

        let pause = if config.jitter { add_jitter(delay) } else { delay };
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
        delay = delay.mul_f64(config.backoff_multiplier).min(config.max_delay);
    }
}

/// Stretch `delay` by a random factor in `[1, 2]`
fn add_jitter(delay: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(1.0..=2.0);
    delay.mul_f64(factor)
}
