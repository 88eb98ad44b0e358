//! Per-album sync: rename reconciliation, timestamp short-circuit, cursor
//! pagination with a newest-first resume boundary, bounded downloads.

use std::io::{ErrorKind, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};

use crate::paths;
use crate::scheduler::BoundedScheduler;
use crate::source::{Album, AlbumSource, Item};
use crate::store::MediaStore;
use crate::track::{AlbumTrackRecord, TrackStore};

/// Engine knobs, decoupled from CLI parsing so tests can drive the engine
/// directly.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub save_root: PathBuf,
    pub concurrent: usize,
    pub page_size: u64,
    pub no_progress_bar: bool,
}

pub struct AlbumSyncEngine {
    source: Arc<dyn AlbumSource>,
    store: Arc<dyn MediaStore>,
    config: EngineConfig,
}

impl AlbumSyncEngine {
    pub fn new(
        source: Arc<dyn AlbumSource>,
        store: Arc<dyn MediaStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    /// Sync one album, resuming from local state. Returns the number of
    /// item downloads that failed (failures are contained, not fatal).
    ///
    /// Assumption: the service returns items newest-first and local
    /// filenames embed the item id verbatim, so the first locally-present
    /// item marks where the previous run stopped and ends the whole album
    /// walk. An upstream order that is not newest-first can hide older
    /// items from the walk.
    pub async fn sync_album(
        &self,
        album: &Album,
        track: &mut TrackStore,
    ) -> anyhow::Result<u64> {
        tracing::info!("syncing album '{}'", album.name);

        let mut record = track
            .get(&album.id)
            .cloned()
            .unwrap_or_else(|| AlbumTrackRecord::new_unsynced(&album.name));

        // Rename must settle before the timestamp check, or a renamed but
        // otherwise unchanged album would look brand new on the next run.
        let album_dir = self.reconcile_dir(album, &mut record).await?;

        if album.last_modified_at <= record.last_synced_at {
            tracing::debug!("album '{}' unchanged upstream", album.name);
            track.put(&album.id, record);
            track.save()?;
            return Ok(0);
        }

        // One snapshot before paginating; downloads landing during the walk
        // must not shift the resume boundary.
        let existing = self
            .store
            .list_entries(&album_dir)
            .await
            .with_context(|| format!("listing {}", album_dir.display()))?;

        let pb = progress_bar(self.config.no_progress_bar, album.item_count);
        let mut scheduler = BoundedScheduler::new(self.config.concurrent);
        let mut cursor: Option<String> = None;

        'pages: loop {
            let page = self
                .source
                .list_items(&album.id, cursor.as_deref(), self.config.page_size)
                .await?;
            let Some(next_cursor) = page.last().map(|item| item.id.clone()) else {
                break;
            };
            if cursor.as_deref() == Some(next_cursor.as_str()) {
                // Settle in-flight downloads before aborting so nothing is
                // still writing past this point.
                scheduler.drain().await;
                anyhow::bail!(
                    "album '{}': no pagination progress at cursor {}",
                    album.name,
                    next_cursor
                );
            }

            for item in page {
                if existing.iter().any(|name| name.contains(&item.id)) {
                    // Reached content a previous run already downloaded.
                    break 'pages;
                }
                self.submit_download(&mut scheduler, item, album_dir.clone(), pb.clone())
                    .await;
            }

            cursor = Some(next_cursor);
        }

        let failed = scheduler.drain().await;
        pb.finish_and_clear();
        if failed > 0 {
            tracing::warn!("album '{}': {} downloads failed", album.name, failed);
        }

        record.last_synced_at = album.last_modified_at;
        track.put(&album.id, record);
        track.save()?;
        Ok(failed)
    }

    /// Bring the local directory in line with the album's current name and
    /// make sure it exists. Idempotent: once the record carries the current
    /// name, only the existence check remains.
    async fn reconcile_dir(
        &self,
        album: &Album,
        record: &mut AlbumTrackRecord,
    ) -> anyhow::Result<PathBuf> {
        let current_dir = self.config.save_root.join(paths::sanitize_name(&album.name));
        if record.name != album.name {
            let old_dir = self.config.save_root.join(paths::sanitize_name(&record.name));
            if old_dir != current_dir {
                match self.store.rename(&old_dir, &current_dir).await {
                    Ok(()) => tracing::info!(
                        "renamed album directory '{}' -> '{}'",
                        record.name,
                        album.name
                    ),
                    // Old directory never existed; ensure_dir below creates
                    // the new one fresh.
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => {
                        return Err(e).with_context(|| {
                            format!(
                                "renaming {} to {}",
                                old_dir.display(),
                                current_dir.display()
                            )
                        })
                    }
                }
            }
            record.name = album.name.clone();
        }
        self.store
            .ensure_dir(&current_dir)
            .await
            .with_context(|| format!("creating {}", current_dir.display()))?;
        Ok(current_dir)
    }

    async fn submit_download(
        &self,
        scheduler: &mut BoundedScheduler,
        item: Item,
        album_dir: PathBuf,
        pb: ProgressBar,
    ) {
        let source = Arc::clone(&self.source);
        let store = Arc::clone(&self.store);
        scheduler
            .submit(async move {
                let result = download_item(source, store, &item, &album_dir).await;
                pb.inc(1);
                result.with_context(|| format!("item {}", item.id))
            })
            .await;
    }
}

/// Fetch one item and stream it into the album directory as
/// `<capture-or-upload-time>.<id>.<extension>`.
async fn download_item(
    source: Arc<dyn AlbumSource>,
    store: Arc<dyn MediaStore>,
    item: &Item,
    album_dir: &Path,
) -> anyhow::Result<()> {
    let (content_type, body) = source.fetch_item(&item.download_url).await?;
    let extension = paths::media_extension(&content_type);
    let file_name = paths::item_file_name(&item.local_time(), &item.id, &extension);
    let path = album_dir.join(file_name);
    tracing::debug!("downloading {}", path.display());
    store
        .write_stream(&path, body)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Hidden when disabled or when stdout is not a TTY (piped output, cron).
fn progress_bar(disabled: bool, total: u64) -> ProgressBar {
    if disabled || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid template")
            .progress_chars("=> "),
    );
    pb
}
