//! In-memory catalog.

use crate::error::DatabaseError;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{Catalog, NewVideo, VideoRecord};

/// Catalog that keeps everything in memory
///
/// Same contract as [`super::Database`], including the duplicate-insert
/// failure. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    videos: Mutex<HashMap<String, VideoRecord>>,
    artwork: Mutex<HashMap<String, String>>,
}

impl MemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded videos
    pub async fn video_count(&self) -> usize {
        self.videos.lock().await.len()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn exists(&self, video_id: &str) -> Result<bool> {
        Ok(self.videos.lock().await.contains_key(video_id))
    }

    async fn insert_video(&self, video: &NewVideo) -> Result<()> {
        let mut videos = self.videos.lock().await;
        if videos.contains_key(&video.video_id) {
            return Err(Error::Database(DatabaseError::ConstraintViolation(format!(
                "video {} is already cataloged",
                video.video_id
            ))));
        }

        videos.insert(
            video.video_id.clone(),
            VideoRecord {
                video_id: video.video_id.clone(),
                title: video.title.clone(),
                channel_name: video.channel_name.clone(),
                channel_handle: video.channel_handle.clone(),
                filename: video.filename.clone(),
                created_at: chrono::Utc::now().timestamp(),
            },
        );
        Ok(())
    }

    async fn get_video(&self, video_id: &str) -> Result<Option<VideoRecord>> {
        Ok(self.videos.lock().await.get(video_id).cloned())
    }

    async fn upsert_artwork(&self, channel_handle: &str, image_filename: &str) -> Result<()> {
        self.artwork
            .lock()
            .await
            .insert(channel_handle.to_string(), image_filename.to_string());
        Ok(())
    }

    async fn get_artwork_filename(&self, channel_handle: &str) -> Result<Option<String>> {
        Ok(self.artwork.lock().await.get(channel_handle).cloned())
    }
}
