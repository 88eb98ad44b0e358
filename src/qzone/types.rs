//! Wire types for the Qzone photo endpoints.

use serde::{Deserialize, Deserializer};

use super::error::QzoneError;
use crate::source::{Album, Item};

/// Common `{ code, message, data }` envelope around every response. `code`
/// is required: a body without one is malformed, not an empty page.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// A non-zero `code` is a fatal API error; otherwise yield the payload
    /// (which the service omits on empty results).
    pub fn into_data(self) -> Result<Option<T>, QzoneError> {
        if self.code != 0 {
            return Err(QzoneError::Api {
                code: self.code,
                message: self.message,
            });
        }
        Ok(self.data)
    }
}

/// `fcg_list_album_v3` payload.
#[derive(Debug, Deserialize)]
pub(crate) struct AlbumListData {
    #[serde(default, rename = "albumList")]
    pub album_list: Option<Vec<RawAlbum>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAlbum {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "flexible_secs")]
    pub lastuploadtime: i64,
    #[serde(default)]
    pub total: u64,
}

impl From<RawAlbum> for Album {
    fn from(raw: RawAlbum) -> Self {
        Album {
            id: raw.id,
            name: raw.name,
            last_modified_at: raw.lastuploadtime,
            item_count: raw.total,
        }
    }
}

/// `cgi_list_photo` payload; only the first photo's key is consumed, to
/// seed floatview pagination.
#[derive(Debug, Deserialize)]
pub(crate) struct PhotoListData {
    #[serde(default, rename = "photoList")]
    pub photo_list: Option<Vec<PhotoKey>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PhotoKey {
    pub lloc: String,
}

/// `cgi_floatview_photo_list_v2` payload.
#[derive(Debug, Deserialize)]
pub(crate) struct FloatviewData {
    #[serde(default)]
    pub photos: Option<Vec<RawItem>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawItem {
    pub lloc: String,
    #[serde(default, rename = "shootTime", deserialize_with = "flexible_secs")]
    pub shoot_time: i64,
    #[serde(default, rename = "uploadTime")]
    pub upload_time: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub video_info: Option<VideoInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoInfo {
    #[serde(default)]
    pub download_url: String,
}

impl From<RawItem> for Item {
    fn from(raw: RawItem) -> Self {
        // Videos carry their real media behind video_info; the plain url is
        // only a preview image.
        let video_url = raw
            .video_info
            .map(|v| v.download_url)
            .filter(|u| !u.is_empty());
        Item {
            id: raw.lloc,
            captured_at: (raw.shoot_time > 0).then_some(raw.shoot_time),
            uploaded_at: raw.upload_time,
            download_url: video_url.unwrap_or(raw.url),
        }
    }
}

/// The API is loose about numeric fields: unix seconds arrive as numbers,
/// numeric strings, or empty strings. Anything unusable becomes 0.
fn flexible_secs<'de, D: Deserializer<'de>>(de: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Float(f64),
        Text(String),
    }
    Ok(match Option::<Raw>::deserialize(de)? {
        Some(Raw::Num(n)) => n,
        Some(Raw::Float(f)) => f as i64,
        Some(Raw::Text(s)) => s.trim().parse().unwrap_or(0),
        None => 0,
    })
}
