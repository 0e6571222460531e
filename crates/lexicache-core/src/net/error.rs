use thiserror::Error;

use crate::cache::StorageError;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Cache storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },
}

/// Maximum length for response bodies quoted in error messages
const MAX_ERROR_BODY_LENGTH: usize = 200;

impl FetchError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build an `InvalidResponse` quoting (a prefix of) the offending body.
    pub fn invalid_body(url: &str, error: &serde_json::Error, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        FetchError::InvalidResponse {
            url: url.to_string(),
            message: format!("{} in {:?}", error, Self::truncate_body(&text)),
        }
    }

    /// True for failures that never reached a server.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::Timeout { .. })
    }
}
