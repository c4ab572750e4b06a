//! Core types for yt-smpl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One playlist item as reported by the video source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    /// Stable video identifier
    pub id: String,
    /// Title as published
    pub title: String,
    /// Display name of the uploading channel (None for private/removed videos)
    pub uploader_name: Option<String>,
    /// Channel handle (e.g. "@someone")
    pub uploader_handle: Option<String>,
    /// URL the source can download the entry from
    pub url: String,
}

impl PlaylistEntry {
    /// Channel name, if the entry is available
    ///
    /// Private and removed videos come back without an uploader; an empty name
    /// is treated the same way.
    pub fn available_uploader(&self) -> Option<&str> {
        self.uploader_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// A fetched playlist
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistInfo {
    /// Playlist title, used as the descriptor name when none is given
    pub title: Option<String>,
    /// Entries in playlist order, with empty placeholders already removed
    pub entries: Vec<PlaylistEntry>,
}

/// One avatar thumbnail offered by a channel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    /// Variant id (e.g. "avatar_uncropped")
    pub id: Option<String>,
    /// Image URL
    pub url: String,
}

/// What the orchestrator does once a stage gives up on an entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and continue with the next entry
    SkipEntry,
    /// Stop processing and surface the error to the caller
    AbortRun,
}

/// Pipeline stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Fetching the audio container
    Download,
    /// Remuxing the container into the audio format
    Convert,
    /// Writing tags and cover art
    Tag,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Download => "download",
            Stage::Convert => "convert",
            Stage::Tag => "tag",
        };
        f.write_str(name)
    }
}

/// Why an entry was not processed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Private or removed video (no uploader)
    Unavailable,
    /// Already present in the catalog from an earlier run
    AlreadyCataloged,
}

/// Event emitted during a run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Playlist metadata fetched
    PlaylistFetched {
        /// Playlist title
        title: Option<String>,
        /// Number of usable entries
        entries: usize,
    },

    /// Processing of an entry started
    EntryStarted {
        /// 1-based position in the playlist
        position: usize,
        /// Number of entries in the playlist
        total: usize,
        /// Video id
        video_id: String,
        /// Normalized title
        title: String,
    },

    /// Entry skipped
    EntrySkipped {
        /// 1-based position in the playlist
        position: usize,
        /// Video id
        video_id: String,
        /// Why it was skipped
        reason: SkipReason,
    },

    /// Audio container downloaded
    Downloaded {
        /// Video id
        video_id: String,
    },

    /// Container converted to the audio format
    Converted {
        /// Video id
        video_id: String,
        /// Path of the audio file
        path: PathBuf,
    },

    /// Tags written
    Tagged {
        /// Video id
        video_id: String,
        /// Whether cover art was embedded
        with_artwork: bool,
    },

    /// Entry recorded in the catalog
    Cataloged {
        /// Video id
        video_id: String,
        /// Stored audio filename
        filename: String,
    },

    /// A stage failed for an entry
    StageFailed {
        /// Video id
        video_id: String,
        /// The stage that failed
        stage: Stage,
        /// Error message
        error: String,
        /// Policy applied to the failure
        policy: FailurePolicy,
    },

    /// Playlist descriptor written
    PlaylistWritten {
        /// Descriptor path
        path: PathBuf,
        /// Number of members
        members: usize,
    },
}

/// Counts produced by one ingestion run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Entries downloaded, converted, tagged and cataloged in this run
    pub ingested: usize,
    /// Entries skipped because they were already cataloged
    pub already_cataloged: usize,
    /// Entries skipped because they are private or removed
    pub unavailable: usize,
    /// Entries skipped after a stage failure
    pub failed: usize,
}

impl IngestReport {
    /// Number of entries seen
    pub fn total(&self) -> usize {
        self.ingested + self.already_cataloged + self.unavailable + self.failed
    }
}
