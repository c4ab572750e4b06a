//! In-process stand-ins for yt-dlp, ffmpeg, the tag writer and the HTTP client

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use yt_smpl::artwork::ImageFetcher;
use yt_smpl::convert::Remuxer;
use yt_smpl::source::VideoSource;
use yt_smpl::tagging::{TagWriter, TrackTags};
use yt_smpl::{Error, PlaylistInfo, Result, Thumbnail};

/// PNG signature plus the start of an IHDR chunk
const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

/// Video source serving a fixed playlist and writing placeholder containers
#[derive(Default)]
pub struct ScriptedSource {
    playlist: PlaylistInfo,
    thumbnails: HashMap<String, Vec<Thumbnail>>,
    broken_urls: HashSet<String>,
    downloads: Mutex<Vec<String>>,
    thumbnail_lookups: AtomicU32,
}

impl ScriptedSource {
    pub fn new(playlist: PlaylistInfo) -> Self {
        Self {
            playlist,
            ..Default::default()
        }
    }

    pub fn with_avatar(mut self, handle: &str, url: &str) -> Self {
        self.thumbnails.insert(
            handle.to_string(),
            vec![
                Thumbnail {
                    id: Some("0".to_string()),
                    url: format!("{}?s=88", url),
                },
                Thumbnail {
                    id: Some("avatar_uncropped".to_string()),
                    url: url.to_string(),
                },
            ],
        );
        self
    }

    /// Every download of `url` fails
    pub fn with_broken_url(mut self, url: &str) -> Self {
        self.broken_urls.insert(url.to_string());
        self
    }

    /// URLs passed to `download_audio`, in call order
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn thumbnail_lookups(&self) -> u32 {
        self.thumbnail_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSource for ScriptedSource {
    async fn fetch_playlist(&self, _url: &str) -> Result<PlaylistInfo> {
        Ok(self.playlist.clone())
    }

    async fn channel_thumbnails(&self, channel_handle: &str) -> Result<Vec<Thumbnail>> {
        self.thumbnail_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .thumbnails
            .get(channel_handle)
            .cloned()
            .unwrap_or_default())
    }

    async fn download_audio(&self, url: &str, dest: &Path) -> Result<()> {
        if let Ok(mut downloads) = self.downloads.lock() {
            downloads.push(url.to_string());
        }
        if self.broken_urls.contains(url) {
            return Err(Error::ExternalTool(format!(
                "ERROR: [youtube] {}: Video unavailable",
                url
            )));
        }
        tokio::fs::write(dest, format!("container for {}", url)).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Remuxer that copies the container, or always fails when broken
#[derive(Default)]
pub struct CopyRemuxer {
    broken: bool,
    calls: AtomicU32,
}

impl CopyRemuxer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Remuxer for CopyRemuxer {
    async fn remux(&self, input: &Path, output: &Path, _format: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(Error::ExternalTool(
                "ffmpeg exited with status 1: Invalid data found when processing input".to_string(),
            ));
        }
        tokio::fs::copy(input, output).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "copy"
    }
}

/// Tag writer that remembers what it wrote
#[derive(Default)]
pub struct MemoryTagWriter {
    written: Mutex<Vec<(PathBuf, TrackTags)>>,
}

impl MemoryTagWriter {
    pub fn written(&self) -> Vec<(PathBuf, TrackTags)> {
        self.written.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TagWriter for MemoryTagWriter {
    async fn write_tags(&self, path: &Path, tags: &TrackTags) -> Result<()> {
        if let Ok(mut written) = self.written.lock() {
            written.push((path.to_path_buf(), tags.clone()));
        }
        Ok(())
    }
}

/// Image fetcher returning a PNG for any URL
#[derive(Default)]
pub struct PngFetcher {
    fetched: Mutex<Vec<String>>,
}

impl PngFetcher {
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ImageFetcher for PngFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(url.to_string());
        }
        Ok(PNG_BYTES.to_vec())
    }
}
