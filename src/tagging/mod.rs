//! Audio file tagging
//!
//! Writes title, artist and a link back to the video into the converted
//! file, plus the channel's artwork as front cover when it can be resolved.
//! Artwork is best-effort: every artwork problem is logged and the file is
//! tagged without a cover. Failing to save the tags is an error.

mod writer;

pub use writer::LoftyTagWriter;

use crate::Result;
use crate::artwork::ArtworkResolver;
use crate::db::Catalog;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Image formats accepted as cover art
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverMime {
    /// image/jpeg
    Jpeg,
    /// image/png
    Png,
}

impl CoverMime {
    /// Classify an image file by its extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "jpg" | "jpeg" => Some(CoverMime::Jpeg),
            "png" => Some(CoverMime::Png),
            _ => None,
        }
    }

    /// MIME type string
    pub fn as_str(self) -> &'static str {
        match self {
            CoverMime::Jpeg => "image/jpeg",
            CoverMime::Png => "image/png",
        }
    }
}

/// Front cover image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    /// Image format
    pub mime: CoverMime,
    /// Raw image bytes
    pub data: Vec<u8>,
}

/// Tag values written into an audio file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTags {
    /// Track title
    pub title: String,
    /// Artist (the channel name)
    pub artist: String,
    /// Comment (the video's watch URL)
    pub comment: String,
    /// Front cover, replacing any existing one
    pub cover: Option<CoverArt>,
}

/// Writes tags into an audio file
#[async_trait]
pub trait TagWriter: Send + Sync {
    /// Replace the file's title, artist and comment, and its front cover if one is given
    async fn write_tags(&self, path: &Path, tags: &TrackTags) -> Result<()>;
}

/// Tags converted files with text metadata and channel artwork
pub struct MetadataTagger {
    writer: Arc<dyn TagWriter>,
    artwork: ArtworkResolver,
    watch_url_base: String,
}

impl MetadataTagger {
    /// Create a tagger
    pub fn new(
        writer: Arc<dyn TagWriter>,
        artwork: ArtworkResolver,
        watch_url_base: impl Into<String>,
    ) -> Self {
        Self {
            writer,
            artwork,
            watch_url_base: watch_url_base.into(),
        }
    }

    /// Tag `file`, returning whether a cover was embedded
    ///
    /// Entries without a channel handle are tagged without artwork.
    ///
    /// # Errors
    ///
    /// Only failures of the tag writer itself are returned.
    pub async fn tag(
        &self,
        file: &Path,
        title: &str,
        video_id: &str,
        channel_name: &str,
        channel_handle: Option<&str>,
        catalog: &dyn Catalog,
    ) -> Result<bool> {
        let cover = match channel_handle {
            Some(handle) => self.load_cover(handle, catalog).await,
            None => {
                tracing::debug!(video_id, "No channel handle, tagging without artwork");
                None
            }
        };
        let with_artwork = cover.is_some();

        let tags = TrackTags {
            title: title.to_string(),
            artist: channel_name.to_string(),
            comment: format!("{}{}", self.watch_url_base, video_id),
            cover,
        };
        self.writer.write_tags(file, &tags).await?;

        tracing::debug!(video_id, file = %file.display(), with_artwork, "Tags written");
        Ok(with_artwork)
    }

    async fn load_cover(&self, channel_handle: &str, catalog: &dyn Catalog) -> Option<CoverArt> {
        let path = match self.artwork.resolve(channel_handle, catalog).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(channel_handle, error = %e, "Channel artwork unavailable");
                return None;
            }
        };

        let Some(mime) = CoverMime::from_path(&path) else {
            tracing::warn!(
                channel_handle,
                path = %path.display(),
                "Unsupported artwork format, use JPEG or PNG"
            );
            return None;
        };

        match tokio::fs::read(&path).await {
            Ok(data) => Some(CoverArt { mime, data }),
            Err(e) => {
                tracing::warn!(channel_handle, path = %path.display(), error = %e, "Failed to read artwork");
                None
            }
        }
    }
}
