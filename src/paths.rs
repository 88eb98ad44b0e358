use chrono::{DateTime, Local};

/// Sanitize an album name for use as a directory name.
///
/// Strips characters that are invalid on common filesystems
/// (`/ \ : * ? " < > |`) plus control characters, and trims surrounding
/// whitespace and trailing dots. A name with nothing left becomes `"_"`.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| {
            !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') && !c.is_control()
        })
        .collect();
    let trimmed = cleaned.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Derive a media extension from a `Content-Type` header value:
/// `"image/jpeg"` -> `"jpeg"`, `"video/mp4; charset=binary"` -> `"mp4"`.
/// Returns an empty string when the subtype is absent.
pub fn media_extension(content_type: &str) -> String {
    content_type
        .split('/')
        .nth(1)
        .map(|subtype| subtype.split(';').next().unwrap_or(subtype).trim())
        .filter(|subtype| !subtype.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// File name for one downloaded item:
/// `<time to second precision>.<item-id>.<extension>`.
///
/// The item id must appear verbatim: resume detection matches it as a
/// substring of existing filenames.
pub fn item_file_name(time: &DateTime<Local>, item_id: &str, extension: &str) -> String {
    let stamp = time.format("%Y-%m-%d %H-%M-%S");
    if extension.is_empty() {
        format!("{}.{}", stamp, item_id)
    } else {
        format!("{}.{}.{}", stamp, item_id, extension)
    }
}
