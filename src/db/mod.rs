//! Catalog store for yt-smpl
//!
//! Records which videos have been ingested and which image belongs to each
//! channel. The catalog is what makes a run resumable: an entry whose video id
//! is already recorded is never downloaded again.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`]: Database lifecycle, schema migrations
//! - [`videos`]: Ingested video records
//! - [`channels`]: Channel artwork records
//!
//! [`MemoryCatalog`] implements the same [`Catalog`] contract without a file.

use crate::Result;
use async_trait::async_trait;
use sqlx::{FromRow, sqlite::SqlitePool};

mod channels;
mod memory;
mod migrations;
mod videos;

pub use memory::MemoryCatalog;

/// Persistent record of ingested videos and channel artwork
///
/// Every mutating call commits on its own; there is no multi-call transaction.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Whether a video has already been ingested
    async fn exists(&self, video_id: &str) -> Result<bool>;

    /// Record an ingested video
    ///
    /// Fails with [`crate::error::DatabaseError::ConstraintViolation`] if the
    /// video id is already recorded.
    async fn insert_video(&self, video: &NewVideo) -> Result<()>;

    /// Look up an ingested video
    async fn get_video(&self, video_id: &str) -> Result<Option<VideoRecord>>;

    /// Insert or replace the artwork filename for a channel
    async fn upsert_artwork(&self, channel_handle: &str, image_filename: &str) -> Result<()>;

    /// Artwork filename stored for a channel, if any
    async fn get_artwork_filename(&self, channel_handle: &str) -> Result<Option<String>>;
}

/// New video to be inserted into the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVideo {
    /// Video identifier (primary key)
    pub video_id: String,
    /// Normalized title
    pub title: String,
    /// Channel display name as published
    pub channel_name: String,
    /// Channel handle, when the source reported one
    pub channel_handle: Option<String>,
    /// Audio file name inside the channel directory
    pub filename: String,
}

/// Video record from the catalog
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct VideoRecord {
    /// Video identifier
    pub video_id: String,
    /// Normalized title
    pub title: String,
    /// Channel display name as published
    pub channel_name: String,
    /// Channel handle
    pub channel_handle: Option<String>,
    /// Audio file name inside the channel directory
    pub filename: String,
    /// Unix timestamp when the video was recorded
    pub created_at: i64,
}

/// SQLite-backed catalog
pub struct Database {
    pool: SqlitePool,
}

#[async_trait]
impl Catalog for Database {
    async fn exists(&self, video_id: &str) -> Result<bool> {
        self.video_exists(video_id).await
    }

    async fn insert_video(&self, video: &NewVideo) -> Result<()> {
        self.record_video(video).await
    }

    async fn get_video(&self, video_id: &str) -> Result<Option<VideoRecord>> {
        self.find_video(video_id).await
    }

    async fn upsert_artwork(&self, channel_handle: &str, image_filename: &str) -> Result<()> {
        self.set_channel_image(channel_handle, image_filename).await
    }

    async fn get_artwork_filename(&self, channel_handle: &str) -> Result<Option<String>> {
        self.get_channel_image(channel_handle).await
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
