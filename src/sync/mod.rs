//! Album iteration and selection around the per-album engine.

pub mod engine;

use std::sync::Arc;

use engine::AlbumSyncEngine;

use crate::source::{Album, AlbumSource};
use crate::track::TrackStore;

/// Externally supplied album selection predicate.
pub type AlbumFilter = dyn Fn(&Album) -> bool + Send + Sync;

pub struct SyncDriver {
    source: Arc<dyn AlbumSource>,
    engine: AlbumSyncEngine,
    filter: Box<AlbumFilter>,
    page_size: u64,
}

impl SyncDriver {
    pub fn new(
        source: Arc<dyn AlbumSource>,
        engine: AlbumSyncEngine,
        filter: Box<AlbumFilter>,
        page_size: u64,
    ) -> Self {
        Self {
            source,
            engine,
            filter,
            page_size,
        }
    }

    /// Walk every album page, sync the selected albums strictly in
    /// sequence, and persist the track store once more at the end.
    ///
    /// An album whose sync fails fatally is logged and skipped so the rest
    /// still sync; the run then exits with an error.
    pub async fn run(&self, track: &mut TrackStore) -> anyhow::Result<()> {
        let mut offset = 0u64;
        let mut failed_items = 0u64;
        let mut failed_albums = 0u64;

        loop {
            let page = self.source.list_albums(offset, self.page_size).await?;
            if page.is_empty() {
                break;
            }
            for album in &page {
                if !(self.filter)(album) {
                    continue;
                }
                match self.engine.sync_album(album, track).await {
                    Ok(failed) => failed_items += failed,
                    Err(e) => {
                        failed_albums += 1;
                        tracing::error!("album '{}' sync failed: {:#}", album.name, e);
                    }
                }
            }
            offset += self.page_size;
        }

        track.save()?;

        if failed_albums > 0 || failed_items > 0 {
            anyhow::bail!(
                "{} album syncs and {} item downloads failed",
                failed_albums,
                failed_items
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;
    use futures_util::{stream, StreamExt};

    use super::*;
    use crate::source::{ByteStream, Item};
    use crate::store::FsMediaStore;
    use crate::sync::engine::EngineConfig;

    /// Fake service with several albums; each album has one item so a sync
    /// leaves an observable trace.
    struct FakeService {
        albums: Vec<Album>,
        album_list_calls: AtomicUsize,
        synced_albums: Mutex<Vec<String>>,
        broken_album_ids: Vec<String>,
    }

    impl FakeService {
        fn new(albums: Vec<Album>) -> Self {
            Self {
                albums,
                album_list_calls: AtomicUsize::new(0),
                synced_albums: Mutex::new(Vec::new()),
                broken_album_ids: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl AlbumSource for FakeService {
        async fn list_albums(&self, offset: u64, page_size: u64) -> anyhow::Result<Vec<Album>> {
            self.album_list_calls.fetch_add(1, Ordering::SeqCst);
            let start = (offset as usize).min(self.albums.len());
            let end = (start + page_size as usize).min(self.albums.len());
            Ok(self.albums[start..end].to_vec())
        }

        async fn list_items(
            &self,
            album_id: &str,
            cursor: Option<&str>,
            _page_size: u64,
        ) -> anyhow::Result<Vec<Item>> {
            if self.broken_album_ids.iter().any(|id| id == album_id) {
                anyhow::bail!("API error -3000: please login");
            }
            if cursor.is_some() {
                return Ok(Vec::new());
            }
            self.synced_albums.lock().unwrap().push(album_id.to_string());
            Ok(vec![Item {
                id: format!("{}-item", album_id),
                captured_at: Some(1_700_000_000),
                uploaded_at: "2024-08-15 10:00:00".to_string(),
                download_url: format!("https://cdn.example/{}-item", album_id),
            }])
        }

        async fn fetch_item(&self, _url: &str) -> anyhow::Result<(String, ByteStream)> {
            let body = stream::iter(vec![Ok(Bytes::from_static(b"x"))]).boxed();
            Ok(("image/jpeg".to_string(), body))
        }
    }

    fn album(id: &str, name: &str) -> Album {
        Album {
            id: id.to_string(),
            name: name.to_string(),
            last_modified_at: 100,
            item_count: 1,
        }
    }

    fn driver_in(
        dir: &std::path::Path,
        service: Arc<FakeService>,
        filter: Box<AlbumFilter>,
        page_size: u64,
    ) -> SyncDriver {
        let engine = AlbumSyncEngine::new(
            service.clone(),
            Arc::new(FsMediaStore),
            EngineConfig {
                save_root: dir.to_path_buf(),
                concurrent: 2,
                page_size,
                no_progress_bar: true,
            },
        );
        SyncDriver::new(service, engine, filter, page_size)
    }

    #[tokio::test]
    async fn test_pagination_terminates_on_empty_page() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(FakeService::new(vec![
            album("a1", "One"),
            album("a2", "Two"),
            album("a3", "Three"),
        ]));
        let driver = driver_in(dir.path(), service.clone(), Box::new(|_| true), 2);
        let mut track = TrackStore::load(dir.path().join("track.json")).unwrap();

        driver.run(&mut track).await.unwrap();

        // Pages: [a1,a2], [a3], []: three listing calls, then stop.
        assert_eq!(service.album_list_calls.load(Ordering::SeqCst), 3);
        let synced = service.synced_albums.lock().unwrap();
        assert!(synced.contains(&"a1".to_string()));
        assert!(synced.contains(&"a2".to_string()));
        assert!(synced.contains(&"a3".to_string()));
    }

    #[tokio::test]
    async fn test_filter_selects_albums() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(FakeService::new(vec![
            album("a1", "Keep"),
            album("a2", "Skip"),
        ]));
        let driver = driver_in(
            dir.path(),
            service.clone(),
            Box::new(|album: &Album| album.name == "Keep"),
            20,
        );
        let mut track = TrackStore::load(dir.path().join("track.json")).unwrap();

        driver.run(&mut track).await.unwrap();

        let synced = service.synced_albums.lock().unwrap();
        assert_eq!(*synced, vec!["a1".to_string()]);
        assert!(track.get("a1").is_some());
        assert!(track.get("a2").is_none());
    }

    #[tokio::test]
    async fn test_failing_album_is_skipped_but_run_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = FakeService::new(vec![album("a1", "Broken"), album("a2", "Fine")]);
        service.broken_album_ids.push("a1".to_string());
        let service = Arc::new(service);
        let driver = driver_in(dir.path(), service.clone(), Box::new(|_| true), 20);
        let mut track = TrackStore::load(dir.path().join("track.json")).unwrap();

        let err = driver.run(&mut track).await.unwrap_err();
        assert!(err.to_string().contains("1 album syncs"));

        // The healthy album still completed and was recorded.
        assert!(track.get("a2").is_some());
        assert!(track.get("a1").is_none());
    }

    #[tokio::test]
    async fn test_final_save_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(FakeService::new(vec![album("a1", "One")]));
        let driver = driver_in(dir.path(), service, Box::new(|_| true), 20);
        let mut track = TrackStore::load(dir.path().join("track.json")).unwrap();

        driver.run(&mut track).await.unwrap();

        let reloaded = TrackStore::load(dir.path().join("track.json")).unwrap();
        assert_eq!(reloaded.get("a1").unwrap().last_synced_at, 100);
    }
}
