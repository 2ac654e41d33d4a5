use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport failure. The request URL is stripped on conversion since
    /// it can carry an API key or webhook token.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {service} (retry after {retry_after_secs}s)")]
    RateLimited {
        service: &'static str,
        retry_after_secs: u64,
    },

    #[error("{service} endpoint not found: {url}")]
    NotFound { service: &'static str, url: String },

    #[error("unexpected HTTP status {status} from {service} at {url}: {body}")]
    UnexpectedStatus {
        service: &'static str,
        status: u16,
        url: String,
        body: String,
    },

    #[error("{service} API error: {message}")]
    Api {
        service: &'static str,
        message: String,
    },

    #[error("{service} response is missing {field}")]
    MissingField {
        service: &'static str,
        field: &'static str,
    },

    #[error("pagination limit reached for {url}: exceeded {max_pages} pages")]
    PaginationLimit { url: String, max_pages: usize },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

impl SourceError {
    /// Server-provided wait hint, when the error carries one.
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            SourceError::RateLimited {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        }
    }

    /// `true` for the HTTP status GitHub returns when listing commits of an
    /// empty repository.
    #[must_use]
    pub fn is_empty_repository(&self) -> bool {
        matches!(self, SourceError::UnexpectedStatus { status: 409, .. })
    }
}
