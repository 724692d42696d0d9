use thiserror::Error;

/// Maximum number of characters of an HTTP error body kept in [`ClientError::Status`].
pub const ERROR_DETAIL_PREVIEW: usize = 200;

/// Maximum number of bytes of an undecodable body kept in [`ClientError::Decode`].
pub const DECODE_PREVIEW: usize = 100;

/// Failures that cross the client boundary.
///
/// Only transport-level problems are represented here. Unexpected response
/// shapes and bad filter expressions degrade to diagnostics instead.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("API request failed with status {status}{}", detail_suffix(.detail))]
    Status { status: u16, detail: String },

    #[error("Failed to parse API response as JSON: {source} (body: {preview:?})")]
    Decode {
        preview: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ClientError {
    pub fn is_connection(&self) -> bool {
        matches!(self, ClientError::Connection(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(" - Details: {}", detail)
    }
}

/// Keeps at most `max_chars` characters of `text`.
pub fn preview_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Lossy UTF-8 preview of at most `max_bytes` bytes.
pub fn preview_bytes(bytes: &[u8], max_bytes: usize) -> String {
    let end = bytes.len().min(max_bytes);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_includes_detail_when_present() {
        let err = ClientError::Status {
            status: 401,
            detail: "not authorized".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API request failed with status 401 - Details: not authorized"
        );
        assert_eq!(err.status(), Some(401));

        let bare = ClientError::Status {
            status: 500,
            detail: String::new(),
        };
        assert_eq!(bare.to_string(), "API request failed with status 500");
    }

    #[test]
    fn previews_are_bounded() {
        let long = "x".repeat(500);
        assert_eq!(preview_chars(&long, ERROR_DETAIL_PREVIEW).len(), 200);
        assert_eq!(preview_bytes(long.as_bytes(), DECODE_PREVIEW).len(), 100);
        assert_eq!(preview_bytes(b"short", DECODE_PREVIEW), "short");
    }

    #[test]
    fn preview_bytes_tolerates_split_utf8() {
        let text = "é".repeat(60);
        let preview = preview_bytes(text.as_bytes(), 101);
        assert!(preview.ends_with('\u{FFFD}'));
    }
}
