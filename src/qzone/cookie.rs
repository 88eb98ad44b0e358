//! Structured view over the raw Qzone cookie blob.

use std::collections::HashMap;

/// Cookie key -> value map built once from the raw `Cookie` header string.
///
/// The sync core never parses cookie text itself; it asks this jar for the
/// handful of values it needs (account id, session checksum input).
#[derive(Clone)]
pub struct CookieJar {
    raw: String,
    values: HashMap<String, String>,
}

impl CookieJar {
    pub fn parse(raw: &str) -> Self {
        let mut values = HashMap::new();
        for piece in raw.split(';') {
            if let Some((key, value)) = piece.split_once('=') {
                values.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Self {
            raw: raw.to_string(),
            values,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The raw header value, sent verbatim on every request.
    pub fn header_value(&self) -> &str {
        &self.raw
    }

    /// The QQ account id (`ptui_loginuin`) embedded in the login cookie.
    pub fn uin(&self) -> Option<&str> {
        self.get("ptui_loginuin")
    }

    /// Session checksum (`g_tk`) the photo API requires alongside the
    /// cookie: a DJB-style hash (seed 5381) over `p_skey`, falling back to
    /// `skey` then `rv2`, masked to 31 bits. Mirrors the web client's JS.
    pub fn g_tk(&self) -> i64 {
        let key = self
            .get("p_skey")
            .or_else(|| self.get("skey"))
            .or_else(|| self.get("rv2"))
            .unwrap_or("");
        let mut hash: u64 = 5381;
        for ch in key.chars() {
            hash = hash
                .wrapping_add(hash.wrapping_shl(5))
                .wrapping_add(ch as u64);
        }
        (hash & 0x7fff_ffff) as i64
    }
}

// The raw blob is a credential; keep it out of logs.
impl std::fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CookieJar({} values, <redacted>)", self.values.len())
    }
}
