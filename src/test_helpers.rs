//! Shared fakes for unit tests.

use crate::artwork::ImageFetcher;
use crate::convert::Remuxer;
use crate::source::VideoSource;
use crate::tagging::{TagWriter, TrackTags};
use crate::types::{PlaylistEntry, PlaylistInfo, Thumbnail};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Smallest byte sequence `infer` recognizes as PNG
pub(crate) const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

/// JPEG SOI + APP0 marker
pub(crate) const JPEG_BYTES: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01,
];

/// GIF89a header
pub(crate) const GIF_BYTES: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00";

/// Build a playlist entry; `uploader: None` makes it private
pub(crate) fn entry(id: &str, title: &str, uploader: Option<&str>) -> PlaylistEntry {
    PlaylistEntry {
        id: id.to_string(),
        title: title.to_string(),
        uploader_name: uploader.map(str::to_string),
        uploader_handle: uploader.map(|u| format!("@{}", u.replace(' ', ""))),
        url: format!("https://www.youtube.com/watch?v={}", id),
    }
}

/// Scriptable [`VideoSource`]
#[derive(Default)]
pub(crate) struct FakeSource {
    playlist: PlaylistInfo,
    thumbnails: HashMap<String, Vec<Thumbnail>>,
    thumbnail_error: bool,
    download_failures: Mutex<HashMap<String, u32>>,
    failure: Option<fn(&str) -> Error>,
    payload: Option<Vec<u8>>,
    refuse_overwrite: bool,
    download_calls: AtomicU32,
    thumbnail_calls: AtomicU32,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_playlist(mut self, playlist: PlaylistInfo) -> Self {
        self.playlist = playlist;
        self
    }

    pub(crate) fn with_thumbnails(mut self, handle: &str, thumbnails: Vec<Thumbnail>) -> Self {
        self.thumbnails.insert(handle.to_string(), thumbnails);
        self
    }

    pub(crate) fn failing_thumbnails(mut self) -> Self {
        self.thumbnail_error = true;
        self
    }

    /// Fail the next `times` downloads of `url`
    pub(crate) fn failing_downloads(self, url: &str, times: u32) -> Self {
        if let Ok(mut failures) = self.download_failures.lock() {
            failures.insert(url.to_string(), times);
        }
        self
    }

    /// Build the error of a failed download from its url
    pub(crate) fn failing_with(mut self, make: fn(&str) -> Error) -> Self {
        self.failure = Some(make);
        self
    }

    /// Write `bytes` as the downloaded audio
    pub(crate) fn serving(mut self, bytes: Vec<u8>) -> Self {
        self.payload = Some(bytes);
        self
    }

    /// Fail instead of overwriting an existing destination
    pub(crate) fn refusing_overwrite(mut self) -> Self {
        self.refuse_overwrite = true;
        self
    }

    pub(crate) fn download_calls(&self) -> u32 {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn thumbnail_calls(&self) -> u32 {
        self.thumbnail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSource for FakeSource {
    async fn fetch_playlist(&self, _url: &str) -> Result<PlaylistInfo> {
        Ok(self.playlist.clone())
    }

    async fn channel_thumbnails(&self, channel_handle: &str) -> Result<Vec<Thumbnail>> {
        self.thumbnail_calls.fetch_add(1, Ordering::SeqCst);
        if self.thumbnail_error {
            return Err(Error::ExternalTool("channel lookup failed".to_string()));
        }
        Ok(self
            .thumbnails
            .get(channel_handle)
            .cloned()
            .unwrap_or_default())
    }

    async fn download_audio(&self, url: &str, dest: &Path) -> Result<()> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);

        let should_fail = match self.download_failures.lock() {
            Ok(mut failures) => match failures.get_mut(url) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            },
            Err(_) => false,
        };
        if should_fail {
            return Err(match self.failure {
                Some(make) => make(url),
                None => Error::ExternalTool(format!("HTTP Error 403 for {}", url)),
            });
        }
        if self.refuse_overwrite && dest.exists() {
            return Err(Error::ExternalTool("destination exists".to_string()));
        }

        match &self.payload {
            Some(bytes) => tokio::fs::write(dest, bytes).await?,
            None => tokio::fs::write(dest, format!("webm audio of {}", url)).await?,
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// [`ImageFetcher`] returning fixed bytes
pub(crate) struct FakeFetcher {
    bytes: Vec<u8>,
    fail: bool,
    calls: AtomicU32,
}

impl FakeFetcher {
    pub(crate) fn returning(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            fail: false,
            calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            bytes: Vec::new(),
            fail: true,
            calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::ExternalTool(format!("connection reset fetching {}", url)));
        }
        Ok(self.bytes.clone())
    }
}

/// [`Remuxer`] that copies the input, optionally failing first
#[derive(Default)]
pub(crate) struct FakeRemuxer {
    failures_left: AtomicU32,
    refuse_overwrite: bool,
    calls: AtomicU32,
}

impl FakeRemuxer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` remuxes
    pub(crate) fn failing(self, times: u32) -> Self {
        self.failures_left.store(times, Ordering::SeqCst);
        self
    }

    pub(crate) fn refusing_overwrite(mut self) -> Self {
        self.refuse_overwrite = true;
        self
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Remuxer for FakeRemuxer {
    async fn remux(&self, input: &Path, output: &Path, _format: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(Error::ExternalTool("Invalid data found when processing input".to_string()));
        }
        if self.refuse_overwrite && output.exists() {
            return Err(Error::ExternalTool("output exists".to_string()));
        }

        tokio::fs::copy(input, output).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// [`TagWriter`] that records what it was asked to write
#[derive(Default)]
pub(crate) struct RecordingTagWriter {
    written: Mutex<Vec<(PathBuf, TrackTags)>>,
    fail: AtomicBool,
}

impl RecordingTagWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing() -> Self {
        let writer = Self::default();
        writer.fail.store(true, Ordering::SeqCst);
        writer
    }

    pub(crate) fn written(&self) -> Vec<(PathBuf, TrackTags)> {
        self.written.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TagWriter for RecordingTagWriter {
    async fn write_tags(&self, path: &Path, tags: &TrackTags) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Tagging {
                path: path.to_path_buf(),
                reason: "read-only file".to_string(),
            });
        }
        if let Ok(mut written) = self.written.lock() {
            written.push((path.to_path_buf(), tags.clone()));
        }
        Ok(())
    }
}

/// Ogg page CRC (polynomial 0x04C11DB7, no reflection)
fn ogg_crc(data: &[u8]) -> u32 {
    let mut crc: u32 = 0;
    for &byte in data {
        crc ^= u32::from(byte) << 24;
        for _ in 0..8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ 0x04C1_1DB7
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn ogg_page(header_type: u8, granule: u64, sequence: u32, packet: &[u8]) -> Vec<u8> {
    let mut segments = vec![255u8; packet.len() / 255];
    segments.push((packet.len() % 255) as u8);

    let mut page = Vec::with_capacity(27 + segments.len() + packet.len());
    page.extend_from_slice(b"OggS");
    page.push(0);
    page.push(header_type);
    page.extend_from_slice(&granule.to_le_bytes());
    page.extend_from_slice(&0x5954_534Du32.to_le_bytes());
    page.extend_from_slice(&sequence.to_le_bytes());
    page.extend_from_slice(&[0; 4]);
    page.push(segments.len() as u8);
    page.extend_from_slice(&segments);
    page.extend_from_slice(packet);

    let crc = ogg_crc(&page);
    page[22..26].copy_from_slice(&crc.to_le_bytes());
    page
}

/// A tiny but well-formed Ogg Opus stream: headers plus one second of "audio"
pub(crate) fn minimal_opus_file() -> Vec<u8> {
    const PRE_SKIP: u16 = 312;

    let mut head = Vec::new();
    head.extend_from_slice(b"OpusHead");
    head.push(1); // version
    head.push(2); // channels
    head.extend_from_slice(&PRE_SKIP.to_le_bytes());
    head.extend_from_slice(&48_000u32.to_le_bytes());
    head.extend_from_slice(&0i16.to_le_bytes());
    head.push(0); // mapping family

    let vendor = b"yt-smpl";
    let mut tags = Vec::new();
    tags.extend_from_slice(b"OpusTags");
    tags.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    tags.extend_from_slice(vendor);
    tags.extend_from_slice(&0u32.to_le_bytes());

    let audio = [0xFCu8, 0xFF, 0xFE];

    let mut file = ogg_page(0x02, 0, 0, &head);
    file.extend(ogg_page(0x00, 0, 1, &tags));
    file.extend(ogg_page(0x04, 48_000 + u64::from(PRE_SKIP), 2, &audio));
    file
}
