//! Application fixtures backed by a temporary directory

use super::fakes::{CopyRemuxer, MemoryTagWriter, PngFetcher, ScriptedSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use yt_smpl::{
    Application, Config, PlaylistDescriptor, PlaylistEntry, PlaylistInfo, RetryConfig, Services,
};

pub const PLAYLIST_URL: &str = "https://www.youtube.com/playlist?list=PLtest";

/// Playlist entry; `uploader: None` makes it private
pub fn entry(id: &str, title: &str, uploader: Option<&str>) -> PlaylistEntry {
    PlaylistEntry {
        id: id.to_string(),
        title: title.to_string(),
        uploader_name: uploader.map(str::to_string),
        uploader_handle: uploader.map(|u| format!("@{}", u.replace(' ', "").to_lowercase())),
        url: watch_url(id),
    }
}

pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

pub fn playlist(title: &str, entries: Vec<PlaylistEntry>) -> PlaylistInfo {
    PlaylistInfo {
        title: Some(title.to_string()),
        entries,
    }
}

/// Config rooted at `root`, with retries that never sleep
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.download.download_dir = root.join("downloads");
    config.download.retry = RetryConfig::immediate(3);
    config.conversion.retry = RetryConfig::immediate(9);
    config.artwork.artwork_dir = root.join("icons");
    config.playlist.playlist_dir = root.join("smpl");
    config.persistence.database_path = root.join("yt-smpl.db");
    config
}

/// An application wired to fakes, plus handles to inspect them
pub struct Harness {
    pub app: Application,
    pub source: Arc<ScriptedSource>,
    pub remuxer: Arc<CopyRemuxer>,
    pub tags: Arc<MemoryTagWriter>,
    pub fetcher: Arc<PngFetcher>,
    config: Config,
    pub dir: TempDir,
}

impl Harness {
    pub async fn new(source: ScriptedSource, remuxer: CopyRemuxer) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        Self::with_config(dir, config, source, remuxer).await
    }

    pub async fn with_config(
        dir: TempDir,
        config: Config,
        source: ScriptedSource,
        remuxer: CopyRemuxer,
    ) -> Self {
        let source = Arc::new(source);
        let remuxer = Arc::new(remuxer);
        let tags = Arc::new(MemoryTagWriter::default());
        let fetcher = Arc::new(PngFetcher::default());
        let app = open_app(&config, &source, &remuxer, &tags, &fetcher).await;

        Self {
            app,
            source,
            remuxer,
            tags,
            fetcher,
            config,
            dir,
        }
    }

    /// Close the catalog and start a fresh application on the same directory
    pub async fn restart(self) -> Self {
        let Harness {
            app,
            source,
            remuxer,
            tags,
            fetcher,
            config,
            dir,
        } = self;
        app.close().await;
        let app = open_app(&config, &source, &remuxer, &tags, &fetcher).await;

        Self {
            app,
            source,
            remuxer,
            tags,
            fetcher,
            config,
            dir,
        }
    }

    pub fn media_file(&self, channel_folder: &str, filename: &str) -> PathBuf {
        self.dir
            .path()
            .join("downloads")
            .join(channel_folder)
            .join(filename)
    }

    pub fn descriptor_path(&self, name: &str) -> PathBuf {
        self.dir.path().join("smpl").join(format!("{}.smpl", name))
    }

    pub fn read_descriptor(&self, name: &str) -> PlaylistDescriptor {
        let raw = std::fs::read(self.descriptor_path(name)).unwrap();
        serde_json::from_slice(&raw).unwrap()
    }
}

async fn open_app(
    config: &Config,
    source: &Arc<ScriptedSource>,
    remuxer: &Arc<CopyRemuxer>,
    tags: &Arc<MemoryTagWriter>,
    fetcher: &Arc<PngFetcher>,
) -> Application {
    let services = Services {
        source: source.clone(),
        remuxer: remuxer.clone(),
        tag_writer: tags.clone(),
        image_fetcher: fetcher.clone(),
    };
    Application::with_services(config.clone(), services)
        .await
        .unwrap()
}

/// `(title, order)` pairs of a descriptor's members
pub fn titles_and_orders(descriptor: &PlaylistDescriptor) -> Vec<(String, usize)> {
    descriptor
        .members
        .iter()
        .map(|m| (m.title.clone(), m.order))
        .collect()
}
