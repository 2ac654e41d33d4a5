//! Discord webhook notifier for run alerts.

use reqwest::{Client, Url};
use serde::Serialize;

use crate::error::SourceError;
use crate::http::{check_status, HttpSettings};
use crate::retry::retry_with_backoff;

const SERVICE: &str = "discord";

/// Discord rejects message content longer than this.
pub const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
}

pub struct DiscordNotifier {
    client: Client,
    webhook_url: Url,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl DiscordNotifier {
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidUrl`] for an unparsable webhook URL, or
    /// [`SourceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(webhook_url: &str, settings: &HttpSettings) -> Result<Self, SourceError> {
        // Parsed as-is: a trailing slash changes the webhook path.
        let webhook_url = Url::parse(webhook_url).map_err(|e| SourceError::InvalidUrl {
            url: "<discord webhook>".to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client: settings.build_client()?,
            webhook_url,
            max_retries: settings.max_retries,
            backoff_base_secs: settings.backoff_base_secs,
        })
    }

    /// Posts `message`, truncated to [`MAX_CONTENT_CHARS`].
    ///
    /// # Errors
    ///
    /// Status and transport errors, after retries.
    pub async fn notify(&self, message: &str) -> Result<(), SourceError> {
        let content = truncate_content(message);
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = self.webhook_url.clone();
            let content = content.as_str();
            async move {
                let response = self
                    .client
                    .post(url)
                    .json(&WebhookMessage { content })
                    .send()
                    .await?;
                check_status(response, SERVICE).await?;
                Ok(())
            }
        })
        .await?;
        tracing::info!(chars = content.chars().count(), "sent Discord alert");
        Ok(())
    }
}

/// Cuts `message` to fit in one webhook post, marking the cut with `…`.
fn truncate_content(message: &str) -> String {
    if message.chars().count() <= MAX_CONTENT_CHARS {
        return message.to_owned();
    }
    let mut cut: String = message.chars().take(MAX_CONTENT_CHARS - 1).collect();
    cut.push('…');
    cut
}
