//! Samsung Music playlist (`.smpl`) generation
//!
//! The descriptor is rebuilt from scratch on every run. It lists the
//! playlist's entries that are both cataloged and still present on disk,
//! in playlist order (or reversed), with dense zero-based `order` values.

use crate::config::PlaylistConfig;
use crate::db::Catalog;
use crate::error::Result;
use crate::naming::{MediaLayout, sanitize_filename};
use crate::types::PlaylistEntry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level `.smpl` document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDescriptor {
    /// Tracks in playback order
    pub members: Vec<Member>,
    /// Playlist name shown on the device
    pub name: String,
    /// Always 0 for a freshly written playlist
    pub recently_played_date: i64,
    /// Sort mode constant
    pub sort_by: i64,
    /// Format version, always 1
    pub version: i64,
}

/// One track in a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Channel display name
    pub artist: String,
    /// Device path of the audio file
    #[serde(rename = "info")]
    pub path: String,
    /// Zero-based position
    pub order: usize,
    /// Track title
    pub title: String,
    /// Member type constant
    #[serde(rename = "type")]
    pub member_type: i64,
}

/// Builds and writes playlist descriptors
pub struct PlaylistGenerator {
    layout: MediaLayout,
    config: PlaylistConfig,
}

impl PlaylistGenerator {
    /// Create a generator that checks files under `layout`
    pub fn new(layout: MediaLayout, config: PlaylistConfig) -> Self {
        Self { layout, config }
    }

    /// Where the descriptor named `name` is written
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.config
            .playlist_dir
            .join(format!("{}.{}", sanitize_filename(name), self.config.extension))
    }

    /// Build the descriptor without writing it
    ///
    /// Entries that were never cataloged, or whose audio file has since been
    /// removed, are left out.
    pub async fn build(
        &self,
        entries: &[PlaylistEntry],
        name: &str,
        catalog: &dyn Catalog,
        reverse: bool,
    ) -> Result<PlaylistDescriptor> {
        let mut members = Vec::new();

        for entry in entries {
            let Some(record) = catalog.get_video(&entry.id).await? else {
                continue;
            };

            let stored = self.layout.stored_path(&record.channel_name, &record.filename);
            if !tokio::fs::try_exists(&stored).await.unwrap_or(false) {
                tracing::debug!(
                    video_id = %record.video_id,
                    path = %stored.display(),
                    "Cataloged file missing on disk, leaving it out"
                );
                continue;
            }

            members.push(Member {
                path: format!(
                    "{}{}/{}",
                    self.config.member_path_prefix,
                    self.layout.rules().channel_folder(&record.channel_name),
                    record.filename
                ),
                artist: record.channel_name,
                order: 0,
                title: record.title,
                member_type: self.config.member_type,
            });
        }

        if reverse {
            members.reverse();
        }
        for (order, member) in members.iter_mut().enumerate() {
            member.order = order;
        }

        Ok(PlaylistDescriptor {
            members,
            name: name.to_string(),
            recently_played_date: 0,
            sort_by: self.config.sort_by,
            version: 1,
        })
    }

    /// Build the descriptor and write it, replacing any earlier one
    ///
    /// Returns the path written.
    pub async fn generate(
        &self,
        entries: &[PlaylistEntry],
        name: &str,
        catalog: &dyn Catalog,
        reverse: bool,
    ) -> Result<PathBuf> {
        let descriptor = self.build(entries, name, catalog, reverse).await?;
        self.write(&descriptor).await
    }

    /// Write a built descriptor to [`Self::output_path`] for its name
    pub async fn write(&self, descriptor: &PlaylistDescriptor) -> Result<PathBuf> {
        let path = self.output_path(&descriptor.name);
        write_descriptor(&path, descriptor).await?;

        tracing::info!(
            path = %path.display(),
            members = descriptor.members.len(),
            "Playlist written"
        );
        Ok(path)
    }
}

async fn write_descriptor(path: &Path, descriptor: &PlaylistDescriptor) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_vec(descriptor)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}
