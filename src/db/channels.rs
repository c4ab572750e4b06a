//! Channel artwork records.

use crate::error::DatabaseError;
use crate::{Error, Result};

use super::Database;

impl Database {
    /// Insert or replace the artwork filename for a channel
    pub async fn set_channel_image(&self, channel_handle: &str, image_filename: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO channel_profiles (channel_handle, image_filename, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(channel_handle) DO UPDATE SET
                image_filename = excluded.image_filename,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(channel_handle)
        .bind(image_filename)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to save artwork for {}: {}",
                channel_handle, e
            )))
        })?;

        tracing::debug!(channel_handle, image_filename, "Channel artwork saved");
        Ok(())
    }

    /// Get the artwork filename for a channel
    ///
    /// Returns None if the channel has never been resolved.
    pub async fn get_channel_image(&self, channel_handle: &str) -> Result<Option<String>> {
        let filename: Option<String> = sqlx::query_scalar(
            "SELECT image_filename FROM channel_profiles WHERE channel_handle = ?",
        )
        .bind(channel_handle)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get artwork for {}: {}",
                channel_handle, e
            )))
        })?;

        Ok(filename)
    }
}
