//! Title/channel text rules and on-disk naming
//!
//! Titles and channel names are rewritten through a table of
//! `{matcher, transform}` rules instead of inline conditionals, so a new
//! channel quirk is a config entry rather than a code change. The default
//! table reproduces the rules the downloader has always shipped with.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Characters that are not allowed in file names on Windows or Unix
const RESTRICTED_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Folder used when a channel name leaves nothing usable as a directory
const UNNAMED_FOLDER: &str = "_";

/// Replace characters that cannot appear in a file name with `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if RESTRICTED_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Which channels a title rule applies to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ChannelMatcher {
    /// Every channel
    Any,
    /// Channels whose display name contains the given text
    NameContains(String),
    /// Channels with exactly this display name
    NameEquals(String),
}

impl ChannelMatcher {
    fn matches(&self, channel_name: &str) -> bool {
        match self {
            ChannelMatcher::Any => true,
            ChannelMatcher::NameContains(needle) => channel_name.contains(needle.as_str()),
            ChannelMatcher::NameEquals(name) => channel_name == name,
        }
    }
}

/// A text rewrite
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TextTransform {
    /// Remove the first match of a regular expression, then trim
    StripPattern(String),
    /// Keep only the text after the last delimiter, if that text is non-empty
    AfterLastDelimiter(String),
}

/// One title rule: a transform applied to titles of matching channels
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRule {
    /// Channels this rule applies to
    pub matcher: ChannelMatcher,
    /// Rewrite applied to the title
    pub transform: TextTransform,
}

/// Serializable rule table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRulesConfig {
    /// Title rules, applied in order
    #[serde(default = "default_title_rules")]
    pub title_rules: Vec<TitleRule>,

    /// Channel-name rules, applied in order to derive the channel folder name
    #[serde(default = "default_channel_rules")]
    pub channel_rules: Vec<TextTransform>,
}

impl Default for TextRulesConfig {
    fn default() -> Self {
        Self {
            title_rules: default_title_rules(),
            channel_rules: default_channel_rules(),
        }
    }
}

fn default_title_rules() -> Vec<TitleRule> {
    vec![
        TitleRule {
            matcher: ChannelMatcher::Any,
            transform: TextTransform::StripPattern("^(블루 아카이브 |블아 )".to_string()),
        },
        TitleRule {
            matcher: ChannelMatcher::Any,
            transform: TextTransform::StripPattern("^【 블루아카이브 】 ".to_string()),
        },
        // One channel publishes "<series> - <song>"; only the song name is kept.
        TitleRule {
            matcher: ChannelMatcher::NameContains("러끼".to_string()),
            transform: TextTransform::AfterLastDelimiter("-".to_string()),
        },
    ]
}

fn default_channel_rules() -> Vec<TextTransform> {
    vec![
        TextTransform::StripPattern("^중년게이머 ".to_string()),
        TextTransform::StripPattern(" 다시보기$".to_string()),
        TextTransform::StripPattern("의 수면교실$".to_string()),
    ]
}

#[derive(Debug, Clone)]
enum CompiledTransform {
    Strip(Regex),
    AfterLast(String),
}

impl CompiledTransform {
    fn compile(transform: &TextTransform, key: &str) -> Result<Self> {
        match transform {
            TextTransform::StripPattern(pattern) => Regex::new(pattern)
                .map(CompiledTransform::Strip)
                .map_err(|e| Error::config(key, format!("invalid pattern '{}': {}", pattern, e))),
            TextTransform::AfterLastDelimiter(delimiter) if delimiter.is_empty() => {
                Err(Error::config(key, "delimiter must not be empty"))
            }
            TextTransform::AfterLastDelimiter(delimiter) => {
                Ok(CompiledTransform::AfterLast(delimiter.clone()))
            }
        }
    }

    fn apply(&self, text: &str) -> String {
        match self {
            CompiledTransform::Strip(re) => re.replace(text, "").trim().to_string(),
            CompiledTransform::AfterLast(delimiter) => match text.rsplit_once(delimiter.as_str()) {
                Some((_, suffix)) if !suffix.trim().is_empty() => suffix.trim().to_string(),
                _ => text.to_string(),
            },
        }
    }
}

/// Compiled rule table
#[derive(Debug, Clone)]
pub struct TextRules {
    title_rules: Vec<(ChannelMatcher, CompiledTransform)>,
    channel_rules: Vec<CompiledTransform>,
}

impl TextRules {
    /// Compile a rule table, rejecting invalid patterns
    pub fn compile(config: &TextRulesConfig) -> Result<Self> {
        let title_rules = config
            .title_rules
            .iter()
            .map(|rule| {
                CompiledTransform::compile(&rule.transform, "text_rules.title_rules")
                    .map(|t| (rule.matcher.clone(), t))
            })
            .collect::<Result<Vec<_>>>()?;
        let channel_rules = config
            .channel_rules
            .iter()
            .map(|t| CompiledTransform::compile(t, "text_rules.channel_rules"))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            title_rules,
            channel_rules,
        })
    }

    /// Normalize a title published by `channel_name`
    pub fn normalize_title(&self, channel_name: &str, title: &str) -> String {
        self.title_rules
            .iter()
            .filter(|(matcher, _)| matcher.matches(channel_name))
            .fold(title.to_string(), |acc, (_, transform)| transform.apply(&acc))
    }

    /// Folder name for a channel: rewritten by the channel rules, then sanitized
    ///
    /// Names that would not stay inside the download directory (empty,
    /// blank, `.` or `..`) become `_`.
    pub fn channel_folder(&self, channel_name: &str) -> String {
        let cleaned = self
            .channel_rules
            .iter()
            .fold(channel_name.to_string(), |acc, transform| transform.apply(&acc));
        let folder = sanitize_filename(&cleaned);
        match folder.trim() {
            "" | "." | ".." => UNNAMED_FOLDER.to_string(),
            _ => folder,
        }
    }
}

/// Where media files live on disk
#[derive(Debug, Clone)]
pub struct MediaLayout {
    download_dir: PathBuf,
    rules: TextRules,
}

impl MediaLayout {
    /// Create a layout rooted at `download_dir`
    pub fn new(download_dir: impl Into<PathBuf>, rules: TextRules) -> Self {
        Self {
            download_dir: download_dir.into(),
            rules,
        }
    }

    /// The rule table used for titles and channel folders
    pub fn rules(&self) -> &TextRules {
        &self.rules
    }

    /// Root download directory
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Directory holding a channel's files
    pub fn channel_dir(&self, channel_name: &str) -> PathBuf {
        self.download_dir.join(self.rules.channel_folder(channel_name))
    }

    /// File name for a video: `<sanitized title> (<id>).<extension>`
    ///
    /// The id keeps names unique when two videos share a title.
    pub fn media_filename(title: &str, video_id: &str, extension: &str) -> String {
        format!("{} ({}).{}", sanitize_filename(title), video_id, extension)
    }

    /// Full path of a video's file under its channel directory
    pub fn media_path(
        &self,
        channel_name: &str,
        title: &str,
        video_id: &str,
        extension: &str,
    ) -> PathBuf {
        self.channel_dir(channel_name)
            .join(Self::media_filename(title, video_id, extension))
    }

    /// Path of an already-named file under its channel directory
    pub fn stored_path(&self, channel_name: &str, filename: &str) -> PathBuf {
        self.channel_dir(channel_name).join(filename)
    }
}
