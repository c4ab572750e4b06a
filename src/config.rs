//! Configuration types for yt-smpl
//!
//! Every field has a serde default, so an empty TOML file (or no file at all)
//! yields the stock layout: `downloads/`, `icons/`, `smpl/` and `yt-smpl.db`
//! under the working directory.

use crate::error::{Error, Result};
use crate::naming::TextRulesConfig;
use crate::types::FailurePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download behavior (directory, container format, retry budget)
    #[serde(default)]
    pub download: DownloadConfig,

    /// Container-to-audio conversion
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Channel artwork and tag values
    #[serde(default)]
    pub artwork: ArtworkConfig,

    /// Playlist descriptor output
    #[serde(default)]
    pub playlist: PlaylistConfig,

    /// External tool paths
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Catalog storage
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// What to do when a pipeline stage gives up on an entry
    #[serde(default)]
    pub policies: FailurePolicies,

    /// Title and channel-name rewrite rules
    #[serde(default)]
    pub text_rules: TextRulesConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw).map_err(|e| Error::Config {
            message: e.to_string(),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot enforce on its own
    pub fn validate(&self) -> Result<()> {
        let extensions = [
            ("download.container_extension", &self.download.container_extension),
            ("conversion.audio_extension", &self.conversion.audio_extension),
            ("playlist.extension", &self.playlist.extension),
        ];
        for (key, ext) in extensions {
            if ext.is_empty() || ext.contains(['.', '/', '\\']) {
                return Err(Error::config(
                    key,
                    format!("'{}' is not a bare file extension", ext),
                ));
            }
        }

        if self
            .download
            .container_extension
            .eq_ignore_ascii_case(&self.conversion.audio_extension)
        {
            return Err(Error::config(
                "conversion.audio_extension",
                "audio extension must differ from the download container extension",
            ));
        }

        for (key, retry) in [
            ("download.retry", &self.download.retry),
            ("conversion.retry", &self.conversion.retry),
        ] {
            if retry.backoff_multiplier < 1.0 {
                return Err(Error::config(key, "backoff_multiplier must be >= 1.0"));
            }
        }

        Ok(())
    }
}

/// Download behavior configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Root directory for per-channel folders (default: "downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Container extension the source delivers (default: "webm")
    #[serde(default = "default_container_extension")]
    pub container_extension: String,

    /// Format selector passed to the source (default: "bestaudio[ext=webm]/best")
    #[serde(default = "default_format_selector")]
    pub format_selector: String,

    /// Retry budget for downloads (default: 3 retries, 4 attempts total)
    #[serde(default = "default_download_retry")]
    pub retry: RetryConfig,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            container_extension: default_container_extension(),
            format_selector: default_format_selector(),
            retry: default_download_retry(),
        }
    }
}

/// Container-to-audio conversion configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Extension of the converted audio file (default: "ogg")
    #[serde(default = "default_audio_extension")]
    pub audio_extension: String,

    /// Muxer name passed to the remux tool (default: "ogg")
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// Retry budget for conversion (default: 9 retries, 10 attempts total)
    #[serde(default = "default_conversion_retry")]
    pub retry: RetryConfig,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            audio_extension: default_audio_extension(),
            output_format: default_output_format(),
            retry: default_conversion_retry(),
        }
    }
}

/// Channel artwork and tag configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtworkConfig {
    /// Flat directory holding one image per channel (default: "icons")
    #[serde(default = "default_artwork_dir")]
    pub artwork_dir: PathBuf,

    /// Thumbnail id preferred when a channel exposes several (default: "avatar_uncropped")
    #[serde(default = "default_preferred_thumbnail")]
    pub preferred_thumbnail: String,

    /// Prefix for the comment tag; the video id is appended
    #[serde(default = "default_watch_url_base")]
    pub watch_url_base: String,

    /// Prefix for channel pages; the channel handle is appended
    #[serde(default = "default_channel_url_base")]
    pub channel_url_base: String,
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            artwork_dir: default_artwork_dir(),
            preferred_thumbnail: default_preferred_thumbnail(),
            watch_url_base: default_watch_url_base(),
            channel_url_base: default_channel_url_base(),
        }
    }
}

/// Playlist descriptor configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaylistConfig {
    /// Output directory for descriptors (default: "smpl")
    #[serde(default = "default_playlist_dir")]
    pub playlist_dir: PathBuf,

    /// Descriptor file extension (default: "smpl")
    #[serde(default = "default_playlist_extension")]
    pub extension: String,

    /// Prepended to `<channel>/<file>` in each member path (default: empty)
    ///
    /// Set this to where the download directory lives on the playback device,
    /// e.g. "/storage/emulated/0/Music/".
    #[serde(default)]
    pub member_path_prefix: String,

    /// Value written to `sortBy` (default: 4)
    #[serde(default = "default_sort_by")]
    pub sort_by: i64,

    /// Value written to every member's `type` (default: 65537)
    #[serde(default = "default_member_type")]
    pub member_type: i64,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            playlist_dir: default_playlist_dir(),
            extension: default_playlist_extension(),
            member_path_prefix: String::new(),
            sort_by: default_sort_by(),
            member_type: default_member_type(),
        }
    }
}

/// External tool paths (yt-dlp, ffmpeg)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Path to ffmpeg executable (auto-detected if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            ffmpeg_path: None,
            search_path: true,
        }
    }
}

/// Catalog storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite catalog path (default: "yt-smpl.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Per-stage failure policy
///
/// The defaults keep the long-standing behavior: a failed download skips the
/// entry, while a failed conversion or tag write aborts the whole run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePolicies {
    /// Policy once the download retry budget is exhausted (default: skip_entry)
    #[serde(default = "default_skip")]
    pub download: FailurePolicy,

    /// Policy once the conversion retry budget is exhausted (default: abort_run)
    #[serde(default = "default_abort")]
    pub conversion: FailurePolicy,

    /// Policy when writing tags fails (default: abort_run)
    #[serde(default = "default_abort")]
    pub tagging: FailurePolicy,
}

impl Default for FailurePolicies {
    fn default() -> Self {
        Self {
            download: FailurePolicy::SkipEntry,
            conversion: FailurePolicy::AbortRun,
            tagging: FailurePolicy::AbortRun,
        }
    }
}

/// Retry configuration for a pipeline stage
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the initial one
    pub max_attempts: u32,

    /// Delay before the first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_ms_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_ms_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl RetryConfig {
    /// Retry configuration with the given budget and default backoff
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }

    /// Retry configuration that retries immediately (no sleeping between attempts)
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    /// Total number of attempts this configuration allows
    pub fn total_attempts(&self) -> u32 {
        self.max_attempts.saturating_add(1)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::with_max_attempts(3)
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_container_extension() -> String {
    "webm".to_string()
}

fn default_format_selector() -> String {
    "bestaudio[ext=webm]/best".to_string()
}

fn default_download_retry() -> RetryConfig {
    RetryConfig::with_max_attempts(3)
}

fn default_audio_extension() -> String {
    "ogg".to_string()
}

fn default_output_format() -> String {
    "ogg".to_string()
}

fn default_conversion_retry() -> RetryConfig {
    RetryConfig {
        initial_delay: Duration::from_millis(500),
        max_delay: Duration::from_secs(5),
        ..RetryConfig::with_max_attempts(9)
    }
}

fn default_artwork_dir() -> PathBuf {
    PathBuf::from("icons")
}

fn default_preferred_thumbnail() -> String {
    "avatar_uncropped".to_string()
}

fn default_watch_url_base() -> String {
    "https://www.youtube.com/watch?v=".to_string()
}

fn default_channel_url_base() -> String {
    "https://www.youtube.com/".to_string()
}

fn default_playlist_dir() -> PathBuf {
    PathBuf::from("smpl")
}

fn default_playlist_extension() -> String {
    "smpl".to_string()
}

fn default_sort_by() -> i64 {
    4
}

fn default_member_type() -> i64 {
    65537
}

fn default_database_path() -> PathBuf {
    PathBuf::from("yt-smpl.db")
}

fn default_true() -> bool {
    true
}

fn default_skip() -> FailurePolicy {
    FailurePolicy::SkipEntry
}

fn default_abort() -> FailurePolicy {
    FailurePolicy::AbortRun
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Durations are written as whole milliseconds
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
