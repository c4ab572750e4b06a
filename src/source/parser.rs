//! Parser for yt-dlp JSON output

use crate::types::{PlaylistEntry, PlaylistInfo, Thumbnail};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawPlaylist {
    title: Option<String>,
    // yt-dlp emits `"entries": null` for some empty listings
    #[serde(default)]
    entries: Option<Vec<Option<RawEntry>>>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    uploader: Option<String>,
    uploader_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawChannel {
    #[serde(default)]
    thumbnails: Option<Vec<RawThumbnail>>,
}

#[derive(Debug, Deserialize)]
struct RawThumbnail {
    id: Option<String>,
    url: Option<String>,
}

/// Parse the output of `yt-dlp --flat-playlist -J <playlist>`
///
/// A missing or `null` entry list parses as empty. `null` entries and entries
/// without an id are dropped. An entry without a
/// URL falls back to `watch_url_base` followed by its id.
pub fn parse_playlist(json: &[u8], watch_url_base: &str) -> crate::Result<PlaylistInfo> {
    let raw: RawPlaylist = serde_json::from_slice(json)?;

    let entries = raw
        .entries
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            let id = entry.id.filter(|id| !id.is_empty())?;
            let url = entry
                .url
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| format!("{}{}", watch_url_base, id));
            Some(PlaylistEntry {
                title: entry.title.unwrap_or_default(),
                uploader_name: entry.uploader,
                uploader_handle: entry.uploader_id.filter(|h| !h.is_empty()),
                url,
                id,
            })
        })
        .collect();

    Ok(PlaylistInfo {
        title: raw.title,
        entries,
    })
}

/// Parse the `thumbnails` list of a channel page listing
///
/// Thumbnails without a URL are dropped.
pub fn parse_channel_thumbnails(json: &[u8]) -> crate::Result<Vec<Thumbnail>> {
    let raw: RawChannel = serde_json::from_slice(json)?;

    Ok(raw
        .thumbnails
        .unwrap_or_default()
        .into_iter()
        .filter_map(|t| {
            Some(Thumbnail {
                url: t.url.filter(|u| !u.is_empty())?,
                id: t.id,
            })
        })
        .collect())
}
