//! Ingested video records.

use crate::error::DatabaseError;
use crate::{Error, Result};

use super::{Database, NewVideo, VideoRecord};

impl Database {
    /// Whether a video id is recorded
    pub async fn video_exists(&self, video_id: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM videos WHERE video_id = ?")
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to check video {}: {}",
                    video_id, e
                )))
            })?;

        Ok(found.is_some())
    }

    /// Insert a video record
    ///
    /// Records are written once and never updated. A second insert for the
    /// same video id fails with [`DatabaseError::ConstraintViolation`].
    pub async fn record_video(&self, video: &NewVideo) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO videos (video_id, title, channel_name, channel_handle, filename, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&video.video_id)
        .bind(&video.title)
        .bind(&video.channel_name)
        .bind(&video.channel_handle)
        .bind(&video.filename)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false);
            if duplicate {
                Error::Database(DatabaseError::ConstraintViolation(format!(
                    "video {} is already cataloged",
                    video.video_id
                )))
            } else {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to insert video {}: {}",
                    video.video_id, e
                )))
            }
        })?;

        tracing::debug!(video_id = %video.video_id, filename = %video.filename, "Video cataloged");
        Ok(())
    }

    /// Get a video record by id
    pub async fn find_video(&self, video_id: &str) -> Result<Option<VideoRecord>> {
        let record = sqlx::query_as::<_, VideoRecord>(
            r#"
            SELECT video_id, title, channel_name, channel_handle, filename, created_at
            FROM videos WHERE video_id = ?
            "#,
        )
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get video {}: {}",
                video_id, e
            )))
        })?;

        Ok(record)
    }

    /// Number of recorded videos
    pub async fn count_videos(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count videos: {}",
                    e
                )))
            })?;

        Ok(count)
    }
}
