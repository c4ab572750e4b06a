//! Remote video source
//!
//! The pipeline never talks to the video platform directly. Everything it
//! needs (playlist listing, channel avatars, audio download) goes through the
//! [`VideoSource`] trait, implemented for the `yt-dlp` binary by [`YtDlpSource`].
//!
//! ## Usage
//!
//! ```no_run
//! use yt_smpl::source::{VideoSource, YtDlpSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = YtDlpSource::from_path().expect("yt-dlp binary not found");
//!
//!     let playlist = source
//!         .fetch_playlist("https://www.youtube.com/playlist?list=PL123")
//!         .await?;
//!     println!("{} entries", playlist.entries.len());
//!     Ok(())
//! }
//! ```

mod parser;
mod ytdlp;

pub use parser::{parse_channel_thumbnails, parse_playlist};
pub use ytdlp::YtDlpSource;

use crate::Result;
use crate::types::{PlaylistInfo, Thumbnail};
use async_trait::async_trait;
use std::path::Path;

/// Access to the remote video platform
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// List a playlist without downloading anything
    ///
    /// Placeholder entries (deleted items the platform reports as empty) are
    /// dropped; private videos are kept and come back without an uploader.
    async fn fetch_playlist(&self, url: &str) -> Result<PlaylistInfo>;

    /// Avatar thumbnails offered by a channel, in the order the platform lists them
    async fn channel_thumbnails(&self, channel_handle: &str) -> Result<Vec<Thumbnail>>;

    /// Download the audio container of one video to exactly `dest`
    ///
    /// The parent directory must already exist. No re-encoding is done.
    async fn download_audio(&self, url: &str, dest: &Path) -> Result<()>;

    /// Name of this implementation for logging
    fn name(&self) -> &'static str;
}
