//! YouTube Data API v3 client for channel subscriber counts.

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::SourceError;
use crate::http::{join_url, normalise_base_url, read_json, HttpSettings};
use crate::retry::retry_with_backoff;

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com";

const SERVICE: &str = "youtube";

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    /// Decimal string, e.g. `"1234"`. Absent when the channel hides it.
    subscriber_count: Option<String>,
}

pub struct YoutubeClient {
    client: Client,
    base_url: Url,
    api_key: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl YoutubeClient {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, settings: &HttpSettings) -> Result<Self, SourceError> {
        Self::with_base_url(YOUTUBE_API_BASE, api_key, settings)
    }

    /// # Errors
    ///
    /// Returns [`SourceError::InvalidUrl`] for an unparsable base URL, or
    /// [`SourceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        settings: &HttpSettings,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: settings.build_client()?,
            base_url: normalise_base_url(base_url)?,
            api_key: api_key.to_owned(),
            max_retries: settings.max_retries,
            backoff_base_secs: settings.backoff_base_secs,
        })
    }

    /// Reads `items[0].statistics.subscriberCount` for `channel_id`.
    ///
    /// # Errors
    ///
    /// - [`SourceError::Api`] when no channel matches the id.
    /// - [`SourceError::MissingField`] when the count is hidden or not a
    ///   non-negative integer.
    /// - Status and transport errors from the request, after retries.
    pub async fn subscriber_count(&self, channel_id: &str) -> Result<u64, SourceError> {
        let mut url = join_url(&self.base_url, "youtube/v3/channels")?;
        url.query_pairs_mut()
            .append_pair("part", "statistics")
            .append_pair("id", channel_id)
            .append_pair("key", &self.api_key);

        let response: ChannelListResponse =
            retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
                let url = url.clone();
                async move {
                    let response = self.client.get(url).send().await?;
                    read_json(response, SERVICE).await
                }
            })
            .await?;

        let Some(channel) = response.items.into_iter().next() else {
            return Err(SourceError::Api {
                service: SERVICE,
                message: format!("no channel found for id {channel_id}"),
            });
        };

        let count = channel
            .statistics
            .and_then(|s| s.subscriber_count)
            .and_then(|s| s.trim().parse::<u64>().ok())
            .ok_or(SourceError::MissingField {
                service: SERVICE,
                field: "items[0].statistics.subscriberCount",
            })?;

        tracing::info!(channel_id, subscribers = count, "fetched YouTube subscribers");
        Ok(count)
    }
}
