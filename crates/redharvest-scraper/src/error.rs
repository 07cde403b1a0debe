use thiserror::Error;

/// Whether an HTTP status marks the session which received it as unusable:
/// auth failures, rate limiting and every 5xx.
#[must_use]
pub fn is_blocking_status(status: u16) -> bool {
    matches!(status, 401 | 403 | 429 | 500..=599)
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("blocked with HTTP status {status} from {url}")]
    Blocked { status: u16, url: String },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ScraperError {
    /// Returns `true` if `self` is a transient condition worth another attempt,
    /// usually on a fresh session.
    ///
    /// Network failures, rate limiting and blocked statuses are retried.
    /// Not-found, other statuses, bad bodies and bad URLs are returned as-is.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            ScraperError::Http(e) => !e.is_builder() && !e.is_decode(),
            ScraperError::RateLimited { .. } | ScraperError::Blocked { .. } => true,
            ScraperError::Deserialize { .. }
            | ScraperError::NotFound { .. }
            | ScraperError::UnexpectedStatus { .. }
            | ScraperError::InvalidUrl { .. } => false,
        }
    }

    /// Returns `true` if the session that produced this error must be retired.
    #[must_use]
    pub fn marks_session_bad(&self) -> bool {
        match self {
            ScraperError::RateLimited { .. } | ScraperError::Blocked { .. } => true,
            ScraperError::UnexpectedStatus { status, .. } => is_blocking_status(*status),
            _ => false,
        }
    }
}
