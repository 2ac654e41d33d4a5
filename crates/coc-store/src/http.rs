//! Object store backed by an HTTP bucket endpoint.
//!
//! Objects live at `{base_url}/{key}`. `GET` returns the bytes (404 means
//! absent) and `PUT` replaces them. An optional bearer token authenticates
//! both.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::error::StoreError;
use crate::validate_key;

pub struct HttpStore {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpStore {
    /// # Errors
    ///
    /// [`StoreError::InvalidUrl`] when `base_url` does not parse,
    /// [`StoreError::Http`] when the client cannot be built.
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, StoreError> {
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| StoreError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url,
            token: token.map(str::to_owned),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// # Errors
    ///
    /// [`StoreError::UnexpectedStatus`] for any non-2xx, non-404 status;
    /// [`StoreError::Http`] for transport failures.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let url = self.object_url(key)?;
        let response = self.authorize(self.client.get(url)).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.bytes().await?.to_vec())),
            status => Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                key: key.to_owned(),
            }),
        }
    }

    /// # Errors
    ///
    /// [`StoreError::UnexpectedStatus`] for any non-2xx status;
    /// [`StoreError::Http`] for transport failures.
    pub async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StoreError> {
        let url = self.object_url(key)?;
        let request = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec());
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                key: key.to_owned(),
            });
        }
        tracing::debug!(key, bytes = bytes.len(), content_type, "uploaded object");
        Ok(())
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn object_url(&self, key: &str) -> Result<Url, StoreError> {
        validate_key(key)?;
        self.base_url.join(key).map_err(|e| StoreError::InvalidUrl {
            url: format!("{}{key}", self.base_url),
            reason: e.to_string(),
        })
    }
}
