use thiserror::Error;

/// Errors from the Qzone web API.
#[derive(Debug, Error)]
pub enum QzoneError {
    /// The response envelope carried a non-zero status code. Fatal: the
    /// service rejected the request, retrying cannot help.
    #[error("Qzone API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl QzoneError {
    /// Whether the transport layer should retry this error. Envelope and
    /// parse errors are final; connection problems, rate limits and server
    /// errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            QzoneError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            QzoneError::Http(_) => true,
            QzoneError::Api { .. } | QzoneError::Json(_) => false,
        }
    }
}
