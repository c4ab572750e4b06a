//! Playlist ingestion
//!
//! Walks a playlist in order and takes every available entry through the
//! stages below, one entry at a time:
//! 1. Skip - private entries and entries already in the catalog
//! 2. Download - audio container into the channel folder (retried)
//! 3. Convert - remux into the audio format (retried)
//! 4. Tag - title, artist, watch URL and channel artwork
//! 5. Record - insert the entry into the catalog
//!
//! What happens when a stage gives up is decided by [`FailurePolicies`]:
//! the entry is skipped, or the run stops and the error is returned.
//! Catalog failures always stop the run.

use crate::config::FailurePolicies;
use crate::convert::AudioConverter;
use crate::db::{Catalog, NewVideo};
use crate::download::AudioDownloader;
use crate::error::{Error, Result};
use crate::naming::MediaLayout;
use crate::tagging::MetadataTagger;
use crate::types::{Event, FailurePolicy, IngestReport, PlaylistEntry, SkipReason, Stage};
use std::path::Path;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Sequential download → convert → tag → record orchestrator
pub struct PlaylistIngester {
    /// Where entries are stored on disk
    layout: MediaLayout,
    /// Download stage
    downloader: AudioDownloader,
    /// Conversion stage
    converter: AudioConverter,
    /// Tagging stage
    tagger: MetadataTagger,
    /// Per-stage failure handling
    policies: FailurePolicies,
    /// Event channel for progress reporting
    event_tx: broadcast::Sender<Event>,
}

impl PlaylistIngester {
    /// Create an ingester from its stages
    pub fn new(
        layout: MediaLayout,
        downloader: AudioDownloader,
        converter: AudioConverter,
        tagger: MetadataTagger,
        policies: FailurePolicies,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            layout,
            downloader,
            converter,
            tagger,
            policies,
            event_tx,
        }
    }

    /// Ingest `entries` in order
    ///
    /// Entries already in the catalog are left untouched, so running the same
    /// playlist again only picks up what is new (or failed last time).
    ///
    /// # Errors
    ///
    /// The error of a stage whose policy is [`FailurePolicy::AbortRun`], or any
    /// catalog error. Entries processed before the failure stay recorded.
    pub async fn run(&self, entries: &[PlaylistEntry], catalog: &dyn Catalog) -> Result<IngestReport> {
        let total = entries.len();
        let mut report = IngestReport::default();

        for (index, entry) in entries.iter().enumerate() {
            let position = index + 1;

            let Some(channel_name) = entry.available_uploader() else {
                debug!(position, video_id = %entry.id, "Skipping unavailable entry");
                report.unavailable += 1;
                self.emit(Event::EntrySkipped {
                    position,
                    video_id: entry.id.clone(),
                    reason: SkipReason::Unavailable,
                });
                continue;
            };

            let title = self.layout.rules().normalize_title(channel_name, &entry.title);
            let container = self.layout.media_path(
                channel_name,
                &title,
                &entry.id,
                self.converter.source_extension(),
            );

            if catalog.exists(&entry.id).await? {
                info!(position, total, video_id = %entry.id, title = %title, "Already cataloged, skipping");
                report.already_cataloged += 1;
                self.emit(Event::EntrySkipped {
                    position,
                    video_id: entry.id.clone(),
                    reason: SkipReason::AlreadyCataloged,
                });
                continue;
            }

            info!(position, total, video_id = %entry.id, title = %title, "Processing entry");
            self.emit(Event::EntryStarted {
                position,
                total,
                video_id: entry.id.clone(),
                title: title.clone(),
            });

            if let Err(e) = self.downloader.download(&container, &entry.url).await {
                self.on_stage_failure(&entry.id, Stage::Download, self.policies.download, e)?;
                report.failed += 1;
                continue;
            }
            self.emit(Event::Downloaded {
                video_id: entry.id.clone(),
            });

            let audio = match self.converter.convert_to_audio_format(&container).await {
                Ok(path) => path,
                Err(e) => {
                    self.on_stage_failure(&entry.id, Stage::Convert, self.policies.conversion, e)?;
                    report.failed += 1;
                    continue;
                }
            };
            self.emit(Event::Converted {
                video_id: entry.id.clone(),
                path: audio.clone(),
            });

            let handle = entry.uploader_handle.as_deref();
            let with_artwork = match self
                .tagger
                .tag(&audio, &title, &entry.id, channel_name, handle, catalog)
                .await
            {
                Ok(with_artwork) => with_artwork,
                Err(e) => {
                    self.on_stage_failure(&entry.id, Stage::Tag, self.policies.tagging, e)?;
                    report.failed += 1;
                    continue;
                }
            };
            self.emit(Event::Tagged {
                video_id: entry.id.clone(),
                with_artwork,
            });

            let filename = stored_filename(&audio)?;
            catalog
                .insert_video(&NewVideo {
                    video_id: entry.id.clone(),
                    title,
                    channel_name: channel_name.to_string(),
                    channel_handle: entry.uploader_handle.clone(),
                    filename: filename.clone(),
                })
                .await?;

            info!(position, total, video_id = %entry.id, filename = %filename, "Entry ingested");
            report.ingested += 1;
            self.emit(Event::Cataloged {
                video_id: entry.id.clone(),
                filename,
            });
        }

        info!(
            ingested = report.ingested,
            already_cataloged = report.already_cataloged,
            unavailable = report.unavailable,
            failed = report.failed,
            "Playlist ingestion finished"
        );
        Ok(report)
    }

    /// Apply `policy` to a failed stage: `Ok` means skip the entry
    fn on_stage_failure(
        &self,
        video_id: &str,
        stage: Stage,
        policy: FailurePolicy,
        err: Error,
    ) -> Result<()> {
        self.emit(Event::StageFailed {
            video_id: video_id.to_string(),
            stage,
            error: err.to_string(),
            policy,
        });

        match policy {
            FailurePolicy::SkipEntry => {
                warn!(video_id, %stage, error = %err, "Stage failed, skipping entry");
                Ok(())
            }
            FailurePolicy::AbortRun => {
                error!(video_id, %stage, error = %err, code = err.error_code(), "Stage failed, aborting run");
                Err(err)
            }
        }
    }

    fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

fn stored_filename(audio: &Path) -> Result<String> {
    audio
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::Other(format!("{} has no file name", audio.display())))
}
