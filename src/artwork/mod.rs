//! Channel artwork resolution
//!
//! Each channel's avatar is downloaded once, stored flat in the artwork
//! directory as `<sanitized handle>.<ext>`, and remembered in the catalog.
//! Later lookups for the same channel never touch the network, even if the
//! file has since disappeared from disk.

mod fetch;

pub use fetch::{HttpImageFetcher, ImageFetcher};

use crate::config::ArtworkConfig;
use crate::db::Catalog;
use crate::error::ArtworkError;
use crate::naming::sanitize_filename;
use crate::source::VideoSource;
use crate::types::Thumbnail;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Pick the thumbnail to use as channel artwork
///
/// The one whose id equals `preferred_id` wins; otherwise the last one listed.
pub fn select_thumbnail<'a>(thumbnails: &'a [Thumbnail], preferred_id: &str) -> Option<&'a Thumbnail> {
    thumbnails
        .iter()
        .find(|t| t.id.as_deref() == Some(preferred_id))
        .or_else(|| thumbnails.last())
}

/// Detect the MIME type of image bytes from their content
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes).map(|kind| kind.mime_type())
}

/// File extension for a supported image MIME type
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Resolves a channel handle to a local artwork file
pub struct ArtworkResolver {
    source: Arc<dyn VideoSource>,
    fetcher: Arc<dyn ImageFetcher>,
    artwork_dir: PathBuf,
    preferred_thumbnail: String,
}

impl ArtworkResolver {
    /// Create a resolver storing images under `config.artwork_dir`
    pub fn new(
        source: Arc<dyn VideoSource>,
        fetcher: Arc<dyn ImageFetcher>,
        config: &ArtworkConfig,
    ) -> Self {
        Self {
            source,
            fetcher,
            artwork_dir: config.artwork_dir.clone(),
            preferred_thumbnail: config.preferred_thumbnail.clone(),
        }
    }

    /// Directory artwork is stored in
    pub fn artwork_dir(&self) -> &Path {
        &self.artwork_dir
    }

    /// Local artwork path for a channel, downloading it on first use
    ///
    /// # Errors
    ///
    /// Lookup, download and storage failures are reported as [`Error::Artwork`];
    /// catalog failures are passed through unchanged.
    pub async fn resolve(&self, channel_handle: &str, catalog: &dyn Catalog) -> Result<PathBuf> {
        if let Some(filename) = catalog.get_artwork_filename(channel_handle).await? {
            tracing::debug!(channel_handle, %filename, "Channel artwork cached");
            return Ok(self.artwork_dir.join(filename));
        }

        let thumbnails = self
            .source
            .channel_thumbnails(channel_handle)
            .await
            .map_err(|e| ArtworkError::Lookup {
                channel_handle: channel_handle.to_string(),
                cause: Box::new(e),
            })?;

        let thumbnail = select_thumbnail(&thumbnails, &self.preferred_thumbnail).ok_or_else(|| {
            ArtworkError::NoArtwork {
                channel_handle: channel_handle.to_string(),
            }
        })?;

        let bytes = self
            .fetcher
            .fetch(&thumbnail.url)
            .await
            .map_err(|e| ArtworkError::ImageDownload {
                url: thumbnail.url.clone(),
                cause: Box::new(e),
            })?;

        let mime = sniff_mime(&bytes);
        let extension = mime
            .and_then(extension_for_mime)
            .ok_or_else(|| ArtworkError::UnsupportedImageType {
                mime: mime.map(str::to_string),
            })?;

        let filename = format!("{}.{}", sanitize_filename(channel_handle), extension);
        let path = self.artwork_dir.join(&filename);
        self.store(&path, &bytes).await.map_err(|e| ArtworkError::ImageDownload {
            url: thumbnail.url.clone(),
            cause: Box::new(e),
        })?;

        catalog.upsert_artwork(channel_handle, &filename).await?;

        tracing::info!(channel_handle, path = %path.display(), "Channel artwork saved");
        Ok(path)
    }

    async fn store(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.artwork_dir).await?;
        tokio::fs::write(path, bytes).await.map_err(Error::Io)
    }
}
