//! Object storage for the history JSON and the published dashboard.
//!
//! Two interchangeable backends sit behind [`ObjectStore`]: a local
//! directory and an HTTP bucket that accepts `GET`/`PUT` per key. Every
//! overwrite of a published object first copies the current version to its
//! backup key.

pub mod error;
pub mod http;
pub mod local;
pub mod persist;

pub use error::StoreError;
pub use http::HttpStore;
pub use local::LocalStore;
pub use persist::{load_history, publish_html, save_history};

use coc_core::{AppConfig, StoreBackend};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

pub enum ObjectStore {
    Local(LocalStore),
    Http(HttpStore),
}

impl ObjectStore {
    /// Builds the backend selected by `COC_STORE_BACKEND`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUrl`] for an unparsable HTTP bucket URL,
    /// or [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, StoreError> {
        match config.store_backend {
            StoreBackend::Local => Ok(Self::Local(LocalStore::new(&config.store_root))),
            StoreBackend::Http => Ok(Self::Http(HttpStore::new(
                &config.store_root,
                config.store_token.as_deref(),
                config.http_timeout_secs,
                &config.http_user_agent,
            )?)),
        }
    }

    /// Reads an object. `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Backend I/O or HTTP failures, or an invalid key.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self {
            Self::Local(store) => store.get(key).await,
            Self::Http(store) => store.get(key).await,
        }
    }

    /// Writes an object, replacing any previous version.
    ///
    /// # Errors
    ///
    /// Backend I/O or HTTP failures, or an invalid key.
    pub async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StoreError> {
        match self {
            Self::Local(store) => store.put(key, bytes).await,
            Self::Http(store) => store.put(key, bytes, content_type).await,
        }
    }

    /// Copies `from` to `to`. Returns `false` when `from` does not exist.
    ///
    /// # Errors
    ///
    /// See [`ObjectStore::get`] and [`ObjectStore::put`].
    pub async fn copy(&self, from: &str, to: &str, content_type: &str) -> Result<bool, StoreError> {
        let Some(bytes) = self.get(from).await? else {
            return Ok(false);
        };
        self.put(to, &bytes, content_type).await?;
        tracing::debug!(from, to, bytes = bytes.len(), "copied object");
        Ok(true)
    }

    /// Human-readable location, for logs and the run report.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Local(store) => format!("local:{}", store.root().display()),
            Self::Http(store) => format!("http:{}", store.base_url()),
        }
    }
}

/// Rejects keys that could escape the bucket root.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let invalid = |reason| {
        Err(StoreError::InvalidKey {
            key: key.to_owned(),
            reason,
        })
    };
    if key.is_empty() {
        return invalid("key is empty");
    }
    if key.starts_with('/') || key.starts_with('\\') {
        return invalid("key must be relative");
    }
    if key.split(['/', '\\']).any(|segment| segment == ".." || segment.is_empty()) {
        return invalid("key must not contain empty or parent segments");
    }
    Ok(())
}
