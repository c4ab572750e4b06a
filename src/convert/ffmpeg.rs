//! Container remuxing with the external ffmpeg binary

use crate::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Copies the audio stream of a container into another container format
#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Write the audio stream of `input` to `output` using the `format` muxer
    ///
    /// Streams are copied, never re-encoded. Video streams are dropped.
    async fn remux(&self, input: &Path, output: &Path, format: &str) -> Result<()>;

    /// Name of this implementation for logging
    fn name(&self) -> &'static str;
}

/// [`Remuxer`] that runs `ffmpeg`
#[derive(Debug, Clone)]
pub struct FfmpegRemuxer {
    binary_path: PathBuf,
}

impl FfmpegRemuxer {
    /// Create a remuxer with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find ffmpeg in PATH
    pub fn from_path() -> Option<Self> {
        which::which("ffmpeg").ok().map(Self::new)
    }

    /// Path of the binary this remuxer runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    fn args(input: &Path, output: &Path, format: &str) -> Vec<std::ffi::OsString> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-i".into(),
            input.as_os_str().to_owned(),
            "-vn".into(),
            "-c".into(),
            "copy".into(),
            "-f".into(),
            format.into(),
            output.as_os_str().to_owned(),
        ]
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    async fn remux(&self, input: &Path, output: &Path, format: &str) -> Result<()> {
        let result = Command::new(&self.binary_path)
            .args(Self::args(input, output, format))
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .map_err(|e| Error::ExternalTool(format!("Failed to execute ffmpeg: {}", e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::ExternalTool(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_copy_audio_without_video() {
        let args = FfmpegRemuxer::args(Path::new("in.webm"), Path::new("out.ogg"), "ogg");
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let i = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[i + 1], "in.webm");
        assert!(args.contains(&"-y".to_string()));
        assert!(args.contains(&"-vn".to_string()));
        let c = args.iter().position(|a| a == "-c").unwrap();
        assert_eq!(args[c + 1], "copy");
        let f = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[f + 1], "ogg");
        assert_eq!(args.last().unwrap(), "out.ogg");
    }

    #[test]
    fn test_from_path_consistency_with_which_crate() {
        let which_result = which::which("ffmpeg");
        let from_path_result = FfmpegRemuxer::from_path();

        assert_eq!(which_result.is_ok(), from_path_result.is_some());
    }

    #[tokio::test]
    async fn test_missing_binary_is_external_tool_error() {
        let remuxer = FfmpegRemuxer::new(PathBuf::from("/nonexistent/ffmpeg-binary-xyz"));
        let err = remuxer
            .remux(Path::new("in.webm"), Path::new("out.ogg"), "ogg")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ExternalTool(_)));
    }

    #[tokio::test]
    #[ignore] // Requires ffmpeg binary in PATH
    async fn test_remux_rejects_non_media_input() {
        let Some(remuxer) = FfmpegRemuxer::from_path() else {
            println!("Skipping test: ffmpeg binary not found in PATH");
            return;
        };

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("garbage.webm");
        std::fs::write(&input, b"not a media file").unwrap();

        let result = remuxer
            .remux(&input, &dir.path().join("garbage.ogg"), "ogg")
            .await;
        assert!(result.is_err());
    }
}
