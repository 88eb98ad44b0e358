//! Seam between the sync core and the remote album service.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use futures_util::stream::BoxStream;

/// Body of one remote item, streamed chunk by chunk.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// One remote album, as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: String,
    pub name: String,
    /// Upstream last-modified time, unix seconds.
    pub last_modified_at: i64,
    /// Expected number of items, used for progress reporting.
    pub item_count: u64,
}

/// One media item within an album page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Opaque locator; doubles as the pagination cursor and the resume key.
    pub id: String,
    /// Capture time, unix seconds, when the service knows it.
    pub captured_at: Option<i64>,
    /// Upload time as reported by the service (`%Y-%m-%d %H:%M:%S`).
    pub uploaded_at: String,
    pub download_url: String,
}

impl Item {
    /// Timestamp used in the local filename: capture time when present,
    /// otherwise the upload time, falling back to the epoch if neither
    /// parses.
    pub fn local_time(&self) -> DateTime<Local> {
        if let Some(secs) = self.captured_at {
            if let Some(dt) = Local.timestamp_opt(secs, 0).single() {
                return dt;
            }
        }
        NaiveDateTime::parse_from_str(&self.uploaded_at, "%Y-%m-%d %H:%M:%S")
            .ok()
            .and_then(|naive| naive.and_local_timezone(Local).single())
            .unwrap_or_else(|| DateTime::from(std::time::UNIX_EPOCH))
    }
}

/// Narrow interface to the remote paginated album service.
///
/// Implementations must keep failure distinct from exhaustion: "no more
/// pages" is an empty `Vec`, never an error.
#[async_trait]
pub trait AlbumSource: Send + Sync {
    /// One page of the account's albums, starting at `offset`.
    async fn list_albums(&self, offset: u64, page_size: u64) -> anyhow::Result<Vec<Album>>;

    /// One page of an album's items after `cursor` (`None` = start of the
    /// album), in the order the service returns them (assumed newest-first).
    async fn list_items(
        &self,
        album_id: &str,
        cursor: Option<&str>,
        page_size: u64,
    ) -> anyhow::Result<Vec<Item>>;

    /// Open a streamed fetch of one item; returns the response content type
    /// and the body stream.
    async fn fetch_item(&self, url: &str) -> anyhow::Result<(String, ByteStream)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(captured_at: Option<i64>, uploaded_at: &str) -> Item {
        Item {
            id: "x".to_string(),
            captured_at,
            uploaded_at: uploaded_at.to_string(),
            download_url: String::new(),
        }
    }

    #[test]
    fn test_local_time_prefers_capture_time() {
        let it = item(Some(1_700_000_000), "2024-08-15 10:00:00");
        assert_eq!(it.local_time().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_local_time_falls_back_to_upload_time() {
        let it = item(None, "2024-08-15 10:00:00");
        let expected = NaiveDateTime::parse_from_str("2024-08-15 10:00:00", "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_local_timezone(Local)
            .unwrap();
        assert_eq!(it.local_time(), expected);
    }

    #[test]
    fn test_local_time_unparseable_upload_time_is_epoch() {
        let it = item(None, "not a time");
        assert_eq!(it.local_time().timestamp(), 0);
    }
}
