//! Video source backed by the external yt-dlp binary

use super::VideoSource;
use super::parser::{parse_channel_thumbnails, parse_playlist};
use crate::types::{PlaylistInfo, Thumbnail};
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

const DEFAULT_FORMAT: &str = "bestaudio[ext=webm]/best";
const DEFAULT_WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";
const DEFAULT_CHANNEL_URL_BASE: &str = "https://www.youtube.com/";

/// Video source that shells out to `yt-dlp`
///
/// # Examples
///
/// ```no_run
/// use yt_smpl::source::{VideoSource, YtDlpSource};
/// use std::path::{Path, PathBuf};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = YtDlpSource::new(PathBuf::from("/usr/local/bin/yt-dlp"))
///     .with_format("bestaudio[ext=webm]/best");
///
/// source
///     .download_audio(
///         "https://www.youtube.com/watch?v=aaa111",
///         Path::new("downloads/Chan/Song (aaa111).webm"),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct YtDlpSource {
    binary_path: PathBuf,
    format_selector: String,
    watch_url_base: String,
    channel_url_base: String,
}

impl YtDlpSource {
    /// Create a source with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            format_selector: DEFAULT_FORMAT.to_string(),
            watch_url_base: DEFAULT_WATCH_URL_BASE.to_string(),
            channel_url_base: DEFAULT_CHANNEL_URL_BASE.to_string(),
        }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Override the format selector used for downloads
    pub fn with_format(mut self, format_selector: impl Into<String>) -> Self {
        self.format_selector = format_selector.into();
        self
    }

    /// Override the URL prefixes used for watch pages and channel pages
    pub fn with_url_bases(
        mut self,
        watch_url_base: impl Into<String>,
        channel_url_base: impl Into<String>,
    ) -> Self {
        self.watch_url_base = watch_url_base.into();
        self.channel_url_base = channel_url_base.into();
        self
    }

    /// Path of the binary this source runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Arguments for a flat JSON listing of `url`
    fn listing_args(url: &str, first_item_only: bool) -> Vec<String> {
        let mut args = vec![
            "--flat-playlist".to_string(),
            "-J".to_string(),
            "--no-warnings".to_string(),
        ];
        if first_item_only {
            args.push("--playlist-items".to_string());
            args.push("1".to_string());
        }
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    /// Arguments for downloading one video's audio to `dest`
    fn download_args(&self, url: &str, dest: &Path) -> Vec<String> {
        vec![
            "-f".to_string(),
            self.format_selector.clone(),
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "--no-part".to_string(),
            "-o".to_string(),
            escape_output_template(&dest.to_string_lossy()),
            "--".to_string(),
            url.to_string(),
        ]
    }

    async fn run(&self, args: &[String]) -> Result<Output> {
        tracing::debug!(binary = %self.binary_path.display(), ?args, "Running yt-dlp");

        let output = Command::new(&self.binary_path)
            .args(args)
            .output()
            .await
            .map_err(|e| Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ExternalTool(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(output)
    }
}

/// Escape `%` so yt-dlp treats the output path literally
fn escape_output_template(path: &str) -> String {
    path.replace('%', "%%")
}

#[async_trait]
impl VideoSource for YtDlpSource {
    async fn fetch_playlist(&self, url: &str) -> Result<PlaylistInfo> {
        let output = self.run(&Self::listing_args(url, false)).await?;
        parse_playlist(&output.stdout, &self.watch_url_base)
    }

    async fn channel_thumbnails(&self, channel_handle: &str) -> Result<Vec<Thumbnail>> {
        let channel_url = format!("{}{}", self.channel_url_base, channel_handle);
        let output = self.run(&Self::listing_args(&channel_url, true)).await?;
        parse_channel_thumbnails(&output.stdout)
    }

    async fn download_audio(&self, url: &str, dest: &Path) -> Result<()> {
        self.run(&self.download_args(url, dest)).await?;

        // yt-dlp exits 0 for some soft failures (e.g. already-recorded archive hits)
        if !tokio::fs::try_exists(dest).await? {
            return Err(Error::ExternalTool(format!(
                "yt-dlp reported success but {} was not written",
                dest.display()
            )));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
