//! # yt-smpl
//!
//! Downloads the audio of a video playlist as tagged Ogg files and writes a
//! Samsung Music playlist (`.smpl`) that points at them.
//!
//! ## Design Philosophy
//!
//! yt-smpl is designed to be:
//! - **Resumable** - A catalog records every finished entry; rerunning a playlist only picks up what is new
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Pluggable** - yt-dlp, ffmpeg, the tag writer and the HTTP client sit behind traits
//! - **Event-driven** - Consumers subscribe to progress events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use yt_smpl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = Application::new(Config::default()).await?;
//!
//!     // Subscribe to events
//!     let mut events = app.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = app
//!         .run("https://www.youtube.com/playlist?list=PL123", None, false)
//!         .await?;
//!     println!("wrote {}", summary.playlist_path.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Application wiring
pub mod app;
/// Channel artwork resolution
pub mod artwork;
/// Configuration types
pub mod config;
/// Container-to-audio conversion
pub mod convert;
/// Catalog persistence layer
pub mod db;
/// Audio download with retry
pub mod download;
/// Error types
pub mod error;
/// Title/channel rules and file layout
pub mod naming;
/// Playlist ingestion orchestrator
pub mod pipeline;
/// `.smpl` playlist generation
pub mod playlist;
/// Retry logic with exponential backoff
pub mod retry;
/// Remote video source
pub mod source;
/// Audio tagging
pub mod tagging;
/// Core types and events
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use app::{Application, RunSummary, Services};
pub use config::{Config, FailurePolicies, RetryConfig};
pub use db::{Catalog, Database, MemoryCatalog, NewVideo, VideoRecord};
pub use error::{ArtworkError, ConvertError, DatabaseError, DownloadError, Error, Result};
pub use pipeline::PlaylistIngester;
pub use playlist::{Member, PlaylistDescriptor, PlaylistGenerator};
pub use types::{
    Event, FailurePolicy, IngestReport, PlaylistEntry, PlaylistInfo, SkipReason, Stage, Thumbnail,
};
