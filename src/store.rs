//! Local filesystem side of the sync.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::source::ByteStream;

/// Narrow interface over the directory an album is mirrored into.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Filenames (not paths) directly inside `dir`; empty when the
    /// directory does not exist yet.
    async fn list_entries(&self, dir: &Path) -> std::io::Result<Vec<String>>;

    async fn ensure_dir(&self, dir: &Path) -> std::io::Result<()>;

    async fn rename(&self, old: &Path, new: &Path) -> std::io::Result<()>;

    /// Stream `body` into the file at `path`.
    async fn write_stream(&self, path: &Path, body: ByteStream) -> std::io::Result<()>;
}

/// [`MediaStore`] backed by the real filesystem. Streamed writes go through
/// a `.part` temp file renamed into place on completion, so readers (and
/// the resume scan of a later run) never see a truncated download.
pub struct FsMediaStore;

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn write_part(part: &Path, mut body: ByteStream) -> std::io::Result<()> {
    let mut file = fs::File::create(part).await?;
    while let Some(chunk) = body.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn list_entries(&self, dir: &Path) -> std::io::Result<Vec<String>> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn ensure_dir(&self, dir: &Path) -> std::io::Result<()> {
        fs::create_dir_all(dir).await
    }

    async fn rename(&self, old: &Path, new: &Path) -> std::io::Result<()> {
        fs::rename(old, new).await
    }

    async fn write_stream(&self, path: &Path, body: ByteStream) -> std::io::Result<()> {
        let part = part_path(path);
        match write_part(&part, body).await {
            Ok(()) => fs::rename(&part, path).await,
            Err(e) => {
                let _ = fs::remove_file(&part).await;
                Err(e)
            }
        }
    }
}
