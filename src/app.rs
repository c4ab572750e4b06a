//! Application wiring
//!
//! [`Application`] owns the catalog and the assembled pipeline. One call to
//! [`Application::run`] fetches a playlist, ingests it and writes its
//! descriptor.

use crate::artwork::{ArtworkResolver, HttpImageFetcher, ImageFetcher};
use crate::config::Config;
use crate::convert::{AudioConverter, FfmpegRemuxer, Remuxer};
use crate::db::Database;
use crate::download::AudioDownloader;
use crate::error::{Error, Result};
use crate::naming::{MediaLayout, TextRules};
use crate::pipeline::PlaylistIngester;
use crate::playlist::PlaylistGenerator;
use crate::source::{VideoSource, YtDlpSource};
use crate::tagging::{LoftyTagWriter, MetadataTagger, TagWriter};
use crate::types::{Event, IngestReport, PlaylistEntry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

/// External collaborators used by the pipeline
#[derive(Clone)]
pub struct Services {
    /// Playlist listing, channel lookup and audio download
    pub source: Arc<dyn VideoSource>,
    /// Container remuxing
    pub remuxer: Arc<dyn Remuxer>,
    /// Tag writing
    pub tag_writer: Arc<dyn TagWriter>,
    /// Artwork download
    pub image_fetcher: Arc<dyn ImageFetcher>,
}

impl Services {
    /// The production collaborators: yt-dlp, ffmpeg, lofty and reqwest
    ///
    /// Explicit tool paths win; otherwise PATH is searched when
    /// `tools.search_path` is set.
    ///
    /// # Errors
    ///
    /// [`Error::NotSupported`] if a required binary cannot be found.
    pub fn discover(config: &Config) -> Result<Self> {
        let tools = &config.tools;

        let ytdlp = match &tools.ytdlp_path {
            Some(path) => YtDlpSource::new(path.clone()),
            None if tools.search_path => YtDlpSource::from_path().ok_or_else(|| {
                Error::NotSupported("yt-dlp not found in PATH, set tools.ytdlp_path".to_string())
            })?,
            None => {
                return Err(Error::NotSupported(
                    "tools.ytdlp_path is not set and PATH search is disabled".to_string(),
                ));
            }
        };
        let ytdlp = ytdlp
            .with_format(config.download.format_selector.clone())
            .with_url_bases(
                config.artwork.watch_url_base.clone(),
                config.artwork.channel_url_base.clone(),
            );

        let ffmpeg = match &tools.ffmpeg_path {
            Some(path) => FfmpegRemuxer::new(path.clone()),
            None if tools.search_path => FfmpegRemuxer::from_path().ok_or_else(|| {
                Error::NotSupported("ffmpeg not found in PATH, set tools.ffmpeg_path".to_string())
            })?,
            None => {
                return Err(Error::NotSupported(
                    "tools.ffmpeg_path is not set and PATH search is disabled".to_string(),
                ));
            }
        };

        tracing::info!(
            ytdlp = %ytdlp.binary_path().display(),
            ffmpeg = %ffmpeg.binary_path().display(),
            "External tools located"
        );

        Ok(Self {
            source: Arc::new(ytdlp),
            remuxer: Arc::new(ffmpeg),
            tag_writer: Arc::new(LoftyTagWriter::new()),
            image_fetcher: Arc::new(HttpImageFetcher::new()?),
        })
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Name written into the descriptor
    pub playlist_name: String,
    /// Descriptor path
    pub playlist_path: PathBuf,
    /// Per-entry counts
    pub report: IngestReport,
}

/// Playlist-to-`.smpl` application
pub struct Application {
    config: Config,
    db: Database,
    source: Arc<dyn VideoSource>,
    ingester: PlaylistIngester,
    generator: PlaylistGenerator,
    event_tx: broadcast::Sender<Event>,
}

impl Application {
    /// Create an application using the production collaborators
    pub async fn new(config: Config) -> Result<Self> {
        let services = Services::discover(&config)?;
        Self::with_services(config, services).await
    }

    /// Create an application with explicit collaborators
    ///
    /// Creates the output directories and opens (or creates) the catalog.
    pub async fn with_services(config: Config, services: Services) -> Result<Self> {
        config.validate()?;

        for dir in [
            &config.download.download_dir,
            &config.artwork.artwork_dir,
            &config.playlist.playlist_dir,
        ] {
            create_dir(dir).await?;
        }

        let db = Database::new(&config.persistence.database_path).await?;

        let rules = TextRules::compile(&config.text_rules)?;
        let layout = MediaLayout::new(config.download.download_dir.clone(), rules);

        let (event_tx, _rx) = broadcast::channel(1000);

        let downloader = AudioDownloader::new(services.source.clone(), config.download.retry.clone());
        let converter = AudioConverter::new(
            services.remuxer.clone(),
            &config.conversion,
            config.download.container_extension.clone(),
        );
        let resolver = ArtworkResolver::new(
            services.source.clone(),
            services.image_fetcher.clone(),
            &config.artwork,
        );
        let tagger = MetadataTagger::new(
            services.tag_writer.clone(),
            resolver,
            config.artwork.watch_url_base.clone(),
        );

        let ingester = PlaylistIngester::new(
            layout.clone(),
            downloader,
            converter,
            tagger,
            config.policies,
            event_tx.clone(),
        );
        let generator = PlaylistGenerator::new(layout, config.playlist.clone());

        tracing::info!(
            source = services.source.name(),
            remuxer = services.remuxer.name(),
            database = %config.persistence.database_path.display(),
            "Application initialized"
        );

        Ok(Self {
            config,
            db,
            source: services.source,
            ingester,
            generator,
            event_tx,
        })
    }

    /// Subscribe to progress events
    ///
    /// Each subscriber receives every event. A subscriber that falls more
    /// than 1000 events behind gets `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The catalog
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Ingest the playlist at `playlist_url` and write its descriptor
    ///
    /// `name` defaults to the playlist's own title. The descriptor is written
    /// even when ingestion aborts, so it reflects everything cataloged so far;
    /// the abort error is returned afterwards.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for a malformed URL or a nameless playlist
    /// - the error that aborted ingestion
    /// - any failure fetching the playlist or writing the descriptor
    pub async fn run(&self, playlist_url: &str, name: Option<&str>, reverse: bool) -> Result<RunSummary> {
        validate_playlist_url(playlist_url)?;

        let playlist = self.source.fetch_playlist(playlist_url).await?;
        self.event_tx
            .send(Event::PlaylistFetched {
                title: playlist.title.clone(),
                entries: playlist.entries.len(),
            })
            .ok();

        let playlist_name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => playlist.title.clone().filter(|t| !t.is_empty()).ok_or_else(|| {
                Error::InvalidInput("playlist has no title, a playlist name is required".to_string())
            })?,
        };
        tracing::info!(name = %playlist_name, reverse, entries = playlist.entries.len(), "Playlist fetched");

        let ingested = self.ingester.run(&playlist.entries, &self.db).await;
        let written = self
            .write_playlist(&playlist.entries, &playlist_name, reverse)
            .await;

        match (ingested, written) {
            (Ok(report), Ok(playlist_path)) => Ok(RunSummary {
                playlist_name,
                playlist_path,
                report,
            }),
            (Ok(_), Err(e)) => Err(e),
            (Err(abort), written) => {
                match written {
                    Ok(path) => tracing::warn!(
                        path = %path.display(),
                        "Run aborted, playlist written with the entries ingested so far"
                    ),
                    Err(e) => tracing::error!(error = %e, "Failed to write playlist after aborted run"),
                }
                Err(abort)
            }
        }
    }

    async fn write_playlist(
        &self,
        entries: &[PlaylistEntry],
        name: &str,
        reverse: bool,
    ) -> Result<PathBuf> {
        let descriptor = self.generator.build(entries, name, &self.db, reverse).await?;
        let path = self.generator.write(&descriptor).await?;
        self.event_tx
            .send(Event::PlaylistWritten {
                path: path.clone(),
                members: descriptor.members.len(),
            })
            .ok();
        Ok(path)
    }

    /// Close the catalog
    pub async fn close(self) {
        self.db.close().await;
    }
}

fn validate_playlist_url(playlist_url: &str) -> Result<()> {
    let parsed = url::Url::parse(playlist_url)
        .map_err(|e| Error::InvalidInput(format!("'{}' is not a valid URL: {}", playlist_url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::InvalidInput(format!(
            "unsupported URL scheme '{}' in {}",
            scheme, playlist_url
        ))),
    }
}

async fn create_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to create directory '{}': {}", dir.display(), e),
        ))
    })
}
