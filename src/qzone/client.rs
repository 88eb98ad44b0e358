use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use super::cookie::CookieJar;
use super::error::QzoneError;
use super::types::{AlbumListData, Envelope, FloatviewData, PhotoListData};
use crate::retry::{retry_with_backoff, RetryAction, RetryConfig};
use crate::source::{Album, AlbumSource, ByteStream, Item};

const ALBUM_LIST_URL: &str =
    "https://user.qzone.qq.com/proxy/domain/photo.qzone.qq.com/fcgi-bin/fcg_list_album_v3";
const PHOTO_LIST_URL: &str =
    "https://h5.qzone.qq.com/proxy/domain/photo.qzone.qq.com/fcgi-bin/cgi_list_photo";
const FLOATVIEW_URL: &str =
    "https://user.qzone.qq.com/proxy/domain/photo.qzone.qq.com/fcgi-bin/cgi_floatview_photo_list_v2";

/// [`AlbumSource`] over the Qzone photo web API.
///
/// Carries the login cookie on every request and retries transient
/// transport failures a fixed number of times beneath the sync engine;
/// envelope errors (`code != 0`) surface immediately.
pub struct QzoneClient {
    http: reqwest::Client,
    cookie: CookieJar,
    uin: String,
    retry: RetryConfig,
}

impl QzoneClient {
    pub fn new(cookie: CookieJar, uin: String, retry: RetryConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(cookie.header_value())
                .map_err(|_| anyhow::anyhow!("cookie contains characters invalid in a header"))?,
        );
        let http = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self {
            http,
            cookie,
            uin,
            retry,
        })
    }

    /// GET `url` with `params`, unwrap the JSONP wrapper, check the
    /// envelope, and parse its payload. Only the transport round trip is
    /// retried; a bad envelope or body is final.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<Option<T>, QzoneError> {
        let body = retry_with_backoff(&self.retry, classify, || async {
            let response = self.http.get(url).query(params).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(QzoneError::HttpStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            Ok(response.text().await?)
        })
        .await?;

        let envelope: Envelope<T> = serde_json::from_str(strip_jsonp(&body))?;
        envelope.into_data()
    }

    /// The album's first photo key, used to seed floatview pagination when
    /// no cursor is given. `None` means the album is empty.
    async fn first_photo_key(&self, album_id: &str) -> Result<Option<String>, QzoneError> {
        let g_tk = self.cookie.g_tk().to_string();
        let params = [
            ("g_tk", g_tk),
            ("mode", "0".to_string()),
            ("idcNum", "4".to_string()),
            ("hostUin", self.uin.clone()),
            ("topicId", album_id.to_string()),
            ("noTopic", "0".to_string()),
            ("uin", self.uin.clone()),
            ("pageStart", "0".to_string()),
            ("pageNum", "1".to_string()),
            ("skipCmtCount", "0".to_string()),
            ("singleurl", "1".to_string()),
            ("notice", "0".to_string()),
            ("appid", "4".to_string()),
            ("inCharset", "utf-8".to_string()),
            ("outCharset", "utf-8".to_string()),
            ("source", "qzone".to_string()),
            ("plat", "qzone".to_string()),
            ("outstyle", "json".to_string()),
            ("format", "jsonp".to_string()),
            ("json_esc", "1".to_string()),
        ];
        let data: Option<PhotoListData> = self.get_json(PHOTO_LIST_URL, &params).await?;
        Ok(data
            .and_then(|d| d.photo_list)
            .and_then(|mut keys| (!keys.is_empty()).then(|| keys.remove(0).lloc)))
    }
}

fn classify(e: &QzoneError) -> RetryAction {
    if e.is_retryable() {
        RetryAction::Retry
    } else {
        RetryAction::Abort
    }
}

/// Qzone endpoints wrap JSON in a JSONP callback (`callback({...});`).
/// Return the inner JSON when the wrapper is present, else the body as-is.
fn strip_jsonp(body: &str) -> &str {
    let trimmed = body.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }
    match (trimmed.find('('), trimmed.rfind(')')) {
        (Some(open), Some(close)) if open < close => &trimmed[open + 1..close],
        _ => trimmed,
    }
}

#[async_trait]
impl AlbumSource for QzoneClient {
    async fn list_albums(&self, offset: u64, page_size: u64) -> anyhow::Result<Vec<Album>> {
        let g_tk = self.cookie.g_tk().to_string();
        let params = [
            ("handset", "4".to_string()),
            ("idcNum", "4".to_string()),
            ("source", "qzone".to_string()),
            ("hostUin", self.uin.clone()),
            ("needUserInfo", "1".to_string()),
            ("filter", "1".to_string()),
            ("g_tk", g_tk),
            ("pageNumModeClass", "15".to_string()),
            ("pageNumModeSort", "40".to_string()),
            ("plat", "qzone".to_string()),
            ("inCharset", "utf-8".to_string()),
            ("outCharset", "utf-8".to_string()),
            ("appid", "4".to_string()),
            ("uin", self.uin.clone()),
            ("notice", "0".to_string()),
            ("mode", "2".to_string()),
            ("sortOrder", "4".to_string()),
            ("pageStart", offset.to_string()),
            ("pageNum", page_size.to_string()),
        ];
        let data: Option<AlbumListData> = self.get_json(ALBUM_LIST_URL, &params).await?;
        Ok(data
            .and_then(|d| d.album_list)
            .map(|raw| raw.into_iter().map(Album::from).collect())
            .unwrap_or_default())
    }

    async fn list_items(
        &self,
        album_id: &str,
        cursor: Option<&str>,
        page_size: u64,
    ) -> anyhow::Result<Vec<Item>> {
        let pivot = match cursor {
            Some(c) => c.to_string(),
            None => match self.first_photo_key(album_id).await? {
                Some(key) => key,
                None => return Ok(Vec::new()),
            },
        };

        let g_tk = self.cookie.g_tk().to_string();
        let params = [
            ("g_tk", g_tk),
            ("topicId", album_id.to_string()),
            ("picKey", pivot.clone()),
            ("shootTime", "0".to_string()),
            ("cmtOrder", "1".to_string()),
            ("fupdate", "1".to_string()),
            ("plat", "qzone".to_string()),
            ("source", "qzone".to_string()),
            ("cmtNum", "0".to_string()),
            ("likeNum", "0".to_string()),
            ("inCharset", "utf-8".to_string()),
            ("outCharset", "utf-8".to_string()),
            ("uin", self.uin.clone()),
            ("hostUin", self.uin.clone()),
            ("appid", "4".to_string()),
            ("sortOrder", "1".to_string()),
            ("showMode", "1".to_string()),
            ("need_private_comment", "0".to_string()),
            ("prevNum", "0".to_string()),
            ("postNum", page_size.to_string()),
        ];
        let data: Option<FloatviewData> = self.get_json(FLOATVIEW_URL, &params).await?;
        let mut items: Vec<Item> = data
            .and_then(|d| d.photos)
            .map(|raw| raw.into_iter().map(Item::from).collect())
            .unwrap_or_default();

        // Floatview pages pivot on the requested key and include it; when
        // resuming from an explicit cursor that item belongs to the
        // previous page, so drop it to keep pages disjoint.
        if cursor.is_some() && items.first().is_some_and(|item| item.id == pivot) {
            items.remove(0);
        }

        Ok(items)
    }

    async fn fetch_item(&self, url: &str) -> anyhow::Result<(String, ByteStream)> {
        let response = retry_with_backoff(&self.retry, classify, || async {
            let response = self.http.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(QzoneError::HttpStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            Ok(response)
        })
        .await?;

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other))
            .boxed();
        Ok((content_type, stream))
    }
}
