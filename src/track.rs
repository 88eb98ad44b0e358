//! Persisted per-album sync checkpoints.
//!
//! The whole map is serialized to `track.json` on every save, so the file on
//! disk is always a complete snapshot, written to a temp file and renamed
//! into place so a crash can never leave it half-written.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `last_synced_at` value for an album that has never completed a sync.
pub const NEVER_SYNCED: i64 = -1;

#[derive(Debug, Error)]
pub enum TrackStoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Checkpoint for one album: the name it was last synced under and the
/// upstream timestamp of that sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumTrackRecord {
    pub name: String,
    pub last_synced_at: i64,
}

impl AlbumTrackRecord {
    pub fn new_unsynced(name: &str) -> Self {
        Self {
            name: name.to_string(),
            last_synced_at: NEVER_SYNCED,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TrackFile {
    #[serde(default)]
    albums: BTreeMap<String, AlbumTrackRecord>,
}

#[derive(Serialize)]
struct TrackFileView<'a> {
    albums: &'a BTreeMap<String, AlbumTrackRecord>,
}

/// Album id -> [`AlbumTrackRecord`] map backed by a JSON snapshot file.
#[derive(Debug)]
pub struct TrackStore {
    path: PathBuf,
    albums: BTreeMap<String, AlbumTrackRecord>,
}

impl TrackStore {
    /// Load the snapshot at `path`; an absent file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, TrackStoreError> {
        let path = path.into();
        let albums = match std::fs::read_to_string(&path) {
            Ok(body) => serde_json::from_str::<TrackFile>(&body)?.albums,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, albums })
    }

    pub fn get(&self, album_id: &str) -> Option<&AlbumTrackRecord> {
        self.albums.get(album_id)
    }

    pub fn put(&mut self, album_id: &str, record: AlbumTrackRecord) {
        self.albums.insert(album_id.to_string(), record);
    }

    /// Persist the whole map, replacing any previous snapshot.
    pub fn save(&self) -> Result<(), TrackStoreError> {
        let body = serde_json::to_string_pretty(&TrackFileView {
            albums: &self.albums,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
