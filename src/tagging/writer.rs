//! Tag writing with the lofty crate

use super::{CoverArt, CoverMime, TagWriter, TrackTags};
use crate::{Error, Result};
use async_trait::async_trait;
use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag, TagExt};
use std::path::{Path, PathBuf};

/// [`TagWriter`] that edits the file's native tag in place
///
/// For Ogg files this is the Vorbis comment block; the cover picture ends up
/// in a base64 `METADATA_BLOCK_PICTURE` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagWriter;

impl LoftyTagWriter {
    /// Create a tag writer
    pub fn new() -> Self {
        Self
    }
}

fn tagging_error(path: &Path, reason: impl std::fmt::Display) -> Error {
    Error::Tagging {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn cover_picture(cover: &CoverArt) -> Picture {
    let mime = match cover.mime {
        CoverMime::Jpeg => MimeType::Jpeg,
        CoverMime::Png => MimeType::Png,
    };
    Picture::new_unchecked(PictureType::CoverFront, Some(mime), None, cover.data.clone())
}

fn write_blocking(path: &Path, tags: &TrackTags) -> Result<()> {
    // `.ogg` carries Opus or Vorbis; the extension alone would pick Vorbis
    let mut tagged_file = Probe::open(path)
        .map_err(|e| tagging_error(path, e))?
        .guess_file_type()
        .map_err(|e| tagging_error(path, format!("failed to detect file type: {}", e)))?
        .read()
        .map_err(|e| tagging_error(path, format!("failed to read audio file: {}", e)))?;

    if tagged_file.primary_tag().is_none() {
        let tag_type = tagged_file.primary_tag_type();
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let tag = tagged_file
        .primary_tag_mut()
        .ok_or_else(|| tagging_error(path, "file type does not support tags"))?;

    tag.set_title(tags.title.clone());
    tag.set_artist(tags.artist.clone());
    tag.set_comment(tags.comment.clone());

    if let Some(cover) = &tags.cover {
        tag.remove_picture_type(PictureType::CoverFront);
        tag.push_picture(cover_picture(cover));
    }

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| tagging_error(path, format!("failed to save tags: {}", e)))
}

#[async_trait]
impl TagWriter for LoftyTagWriter {
    async fn write_tags(&self, path: &Path, tags: &TrackTags) -> Result<()> {
        let owned_path: PathBuf = path.to_path_buf();
        let owned_tags = tags.clone();

        tokio::task::spawn_blocking(move || write_blocking(&owned_path, &owned_tags))
            .await
            .map_err(|e| tagging_error(path, format!("tag writer task failed: {}", e)))?
    }
}
