//! Error types for yt-smpl
//!
//! Errors are grouped by the pipeline stage that raises them:
//! - [`DownloadError`] - audio download exhausted its retry budget (skippable per entry)
//! - [`ConvertError`] - container remux failed (aborts the run by default)
//! - [`ArtworkError`] - channel artwork could not be resolved (always soft)
//!
//! Lower layers attach the originating cause; each caller decides locally whether
//! to retry, skip the entry, or abort the run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for yt-smpl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for yt-smpl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download.retry")
        key: Option<String>,
    },

    /// Catalog operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Audio download failed after all attempts
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// Container conversion failed
    #[error("conversion error: {0}")]
    Convert(#[from] ConvertError),

    /// Channel artwork could not be resolved
    #[error("artwork error: {0}")]
    Artwork(#[from] ArtworkError),

    /// Writing tags into the converted file failed
    #[error("failed to tag {path}: {reason}")]
    Tagging {
        /// The audio file being tagged
        path: PathBuf,
        /// The reason tagging failed
        reason: String,
    },

    /// Input rejected before any work was attempted (never retried)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// External tool execution failed (yt-dlp, ffmpeg)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary, unsupported image format, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Constraint violation (e.g., duplicate video id)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Download-related errors
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Every download attempt failed
    #[error("download of {url} failed after {attempts} attempt(s): {cause}")]
    RetriesExhausted {
        /// The video URL that could not be fetched
        url: String,
        /// Total number of attempts made (initial + retries)
        attempts: u32,
        /// The failure of the final attempt
        #[source]
        cause: Box<Error>,
    },
}

/// Conversion-related errors
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A single remux attempt failed
    #[error("failed to convert {input} into {output}: {cause}")]
    FileConversion {
        /// The container file being converted
        input: PathBuf,
        /// The target audio file
        output: PathBuf,
        /// Underlying failure (tool error, I/O error)
        #[source]
        cause: Box<Error>,
    },

    /// Every conversion attempt failed
    #[error("conversion of {input} failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        /// The container file that could not be converted
        input: PathBuf,
        /// Total number of attempts made
        attempts: u32,
        /// The failure of the final attempt
        #[source]
        last: Box<Error>,
    },
}

/// Channel artwork errors
///
/// These never abort a run: the tagger logs them and tags without a cover.
#[derive(Debug, Error)]
pub enum ArtworkError {
    /// The channel exposes no avatar thumbnails
    #[error("no artwork available for channel {channel_handle}")]
    NoArtwork {
        /// The channel handle that was looked up
        channel_handle: String,
    },

    /// Looking up the channel's thumbnails failed
    #[error("failed to look up artwork for channel {channel_handle}: {cause}")]
    Lookup {
        /// The channel handle that was looked up
        channel_handle: String,
        /// Underlying failure
        #[source]
        cause: Box<Error>,
    },

    /// Downloading or storing the image failed
    #[error("failed to download channel artwork from {url}: {cause}")]
    ImageDownload {
        /// The image URL
        url: String,
        /// Underlying failure
        #[source]
        cause: Box<Error>,
    },

    /// The image bytes are not a supported image type
    #[error("unsupported image type: {}", mime.as_deref().unwrap_or("unknown"))]
    UnsupportedImageType {
        /// The sniffed MIME type, if any
        mime: Option<String>,
    },
}

impl Error {
    /// Build a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Short machine-readable code for this error, used in events and logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(DatabaseError::ConstraintViolation(_)) => "constraint_violation",
            Error::Database(_) | Error::Sqlx(_) => "database_error",
            Error::Download(_) => "download_failed",
            Error::Convert(ConvertError::FileConversion { .. }) => "conversion_failed",
            Error::Convert(ConvertError::RetriesExhausted { .. }) => "conversion_retries_exhausted",
            Error::Artwork(_) => "artwork_unavailable",
            Error::Tagging { .. } => "tagging_failed",
            Error::InvalidInput(_) => "invalid_input",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ExternalTool(_) => "external_tool_error",
            Error::NotSupported(_) => "not_supported",
            Error::Other(_) => "internal_error",
        }
    }
}
