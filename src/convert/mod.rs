//! Container-to-audio conversion with retry
//!
//! The downloaded container is stream-copied into the audio format next to
//! it (same stem, new extension). The container is deleted once a remux
//! succeeds, so a converted entry keeps exactly one file on disk.

mod ffmpeg;

pub use ffmpeg::{FfmpegRemuxer, Remuxer};

use crate::config::{ConversionConfig, RetryConfig};
use crate::error::ConvertError;
use crate::retry::with_retry;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Converts downloaded containers into the configured audio format
pub struct AudioConverter {
    remuxer: Arc<dyn Remuxer>,
    source_extension: String,
    target_extension: String,
    output_format: String,
    retry: RetryConfig,
}

impl AudioConverter {
    /// Create a converter accepting `source_extension` inputs
    pub fn new(
        remuxer: Arc<dyn Remuxer>,
        config: &ConversionConfig,
        source_extension: impl Into<String>,
    ) -> Self {
        Self {
            remuxer,
            source_extension: source_extension.into(),
            target_extension: config.audio_extension.clone(),
            output_format: config.output_format.clone(),
            retry: config.retry.clone(),
        }
    }

    /// Container extension accepted as input
    pub fn source_extension(&self) -> &str {
        &self.source_extension
    }

    /// Path the converted file is written to for `input`
    pub fn target_path(&self, input: &Path) -> PathBuf {
        input.with_extension(&self.target_extension)
    }

    /// Convert `input` and return the path of the audio file
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if `input` does not carry the source extension
    ///   (checked once, never retried)
    /// - [`ConvertError::RetriesExhausted`] once every attempt has failed
    pub async fn convert_to_audio_format(&self, input: &Path) -> Result<PathBuf> {
        let matches_source = input
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.source_extension));
        if !matches_source {
            return Err(Error::InvalidInput(format!(
                "{} is not a .{} file",
                input.display(),
                self.source_extension
            )));
        }

        let output = self.target_path(input);
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let target = output.as_path();

        let result = with_retry(&self.retry, move || {
            counter.fetch_add(1, Ordering::Relaxed);
            self.attempt(input, target)
        })
        .await;

        match result {
            Ok(()) => {
                tracing::debug!(
                    input = %input.display(),
                    output = %output.display(),
                    remuxer = self.remuxer.name(),
                    "Converted"
                );
                Ok(output)
            }
            Err(last) => Err(Error::Convert(ConvertError::RetriesExhausted {
                input: input.to_path_buf(),
                attempts: attempts.load(Ordering::Relaxed),
                last: Box::new(last),
            })),
        }
    }

    async fn attempt(&self, input: &Path, output: &Path) -> Result<()> {
        let result = async {
            match tokio::fs::remove_file(output).await {
                Ok(()) => tracing::debug!(output = %output.display(), "Removed stale target"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::Io(e)),
            }

            self.remuxer.remux(input, output, &self.output_format).await?;
            tokio::fs::remove_file(input).await?;
            Ok::<(), Error>(())
        }
        .await;

        result.map_err(|cause| {
            Error::Convert(ConvertError::FileConversion {
                input: input.to_path_buf(),
                output: output.to_path_buf(),
                cause: Box::new(cause),
            })
        })
    }
}
