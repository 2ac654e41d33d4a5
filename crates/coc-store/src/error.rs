use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transport failure, with the request URL stripped.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("unexpected HTTP status {status} for object {key}")]
    UnexpectedStatus { status: u16, key: String },

    #[error("invalid object key \"{key}\": {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("invalid store URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("history objects {key} and {backup_key} exist but neither is readable")]
    Corrupt { key: String, backup_key: String },

    #[error(transparent)]
    Core(#[from] coc_core::CoreError),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
