//! X/Twitter v2 client for the follower count of one account.

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::SourceError;
use crate::http::{join_url, normalise_base_url, read_json, HttpSettings};
use crate::retry::retry_with_backoff;

pub const TWITTER_API_BASE: &str = "https://api.twitter.com";

const SERVICE: &str = "twitter";

#[derive(Debug, Deserialize)]
struct UserResponse {
    data: Option<UserData>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Deserialize)]
struct PublicMetrics {
    followers_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

pub struct TwitterClient {
    client: Client,
    base_url: Url,
    bearer_token: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl TwitterClient {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(bearer_token: &str, settings: &HttpSettings) -> Result<Self, SourceError> {
        Self::with_base_url(TWITTER_API_BASE, bearer_token, settings)
    }

    /// # Errors
    ///
    /// Returns [`SourceError::InvalidUrl`] for an unparsable base URL, or
    /// [`SourceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        base_url: &str,
        bearer_token: &str,
        settings: &HttpSettings,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: settings.build_client()?,
            base_url: normalise_base_url(base_url)?,
            bearer_token: bearer_token.to_owned(),
            max_retries: settings.max_retries,
            backoff_base_secs: settings.backoff_base_secs,
        })
    }

    /// Reads `data.public_metrics.followers_count` for `username`.
    ///
    /// # Errors
    ///
    /// - [`SourceError::Api`] when the response carries an `errors` array
    ///   and no `data` (unknown or suspended account).
    /// - [`SourceError::MissingField`] when the count is absent.
    /// - Status and transport errors from the request, after retries.
    pub async fn follower_count(&self, username: &str) -> Result<u64, SourceError> {
        let mut url = join_url(&self.base_url, &format!("2/users/by/username/{username}"))?;
        url.query_pairs_mut()
            .append_pair("user.fields", "public_metrics");

        let response: UserResponse =
            retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
                let url = url.clone();
                async move {
                    let response = self
                        .client
                        .get(url)
                        .bearer_auth(&self.bearer_token)
                        .send()
                        .await?;
                    read_json(response, SERVICE).await
                }
            })
            .await?;

        if response.data.is_none() {
            if let Some(err) = response.errors.first() {
                let message = err
                    .detail
                    .clone()
                    .or_else(|| err.title.clone())
                    .unwrap_or_else(|| "unknown error".to_owned());
                return Err(SourceError::Api {
                    service: SERVICE,
                    message,
                });
            }
        }

        let count = response
            .data
            .and_then(|d| d.public_metrics)
            .and_then(|m| m.followers_count)
            .ok_or(SourceError::MissingField {
                service: SERVICE,
                field: "data.public_metrics.followers_count",
            })?;

        tracing::info!(username, followers = count, "fetched X/Twitter followers");
        Ok(count)
    }
}
