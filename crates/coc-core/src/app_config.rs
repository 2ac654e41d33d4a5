use chrono_tz::Tz;

/// Where the history JSON and dashboard HTML live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// `COC_STORE_ROOT` is a directory acting as the bucket.
    Local,
    /// `COC_STORE_ROOT` is a bucket base URL accepting `GET`/`PUT` per key.
    Http,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Local => write!(f, "local"),
            StoreBackend::Http => write!(f, "http"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub github_token: String,
    pub github_username: String,
    pub github_organization: Option<String>,
    pub twitter_bearer_token: Option<String>,
    pub twitter_username: Option<String>,
    pub youtube_api_key: Option<String>,
    pub youtube_channel_id: Option<String>,
    pub bluesky_handle: Option<String>,
    /// `identifier:password` pair used to open an authenticated session.
    pub bluesky_credentials: Option<String>,
    pub discord_webhook_url: Option<String>,
    pub store_backend: StoreBackend,
    pub store_root: String,
    pub store_token: Option<String>,
    pub html_key: String,
    pub html_backup_key: String,
    pub history_key: String,
    pub history_backup_key: String,
    pub timezone: Tz,
    pub schedule: String,
    pub http_timeout_secs: u64,
    pub http_user_agent: String,
    pub http_max_retries: u32,
    pub http_retry_backoff_base_secs: u64,
    pub http_inter_request_delay_ms: u64,
}

impl AppConfig {
    /// Bearer token and username, when X/Twitter is configured.
    #[must_use]
    pub fn twitter_account(&self) -> Option<(&str, &str)> {
        match (&self.twitter_bearer_token, &self.twitter_username) {
            (Some(token), Some(username)) => Some((token.as_str(), username.as_str())),
            _ => None,
        }
    }

    /// API key and channel id, when YouTube is configured.
    #[must_use]
    pub fn youtube_channel(&self) -> Option<(&str, &str)> {
        match (&self.youtube_api_key, &self.youtube_channel_id) {
            (Some(key), Some(channel)) => Some((key.as_str(), channel.as_str())),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("github_token", &"[redacted]")
            .field("github_username", &self.github_username)
            .field("github_organization", &self.github_organization)
            .field("twitter_bearer_token", &redact(&self.twitter_bearer_token))
            .field("twitter_username", &self.twitter_username)
            .field("youtube_api_key", &redact(&self.youtube_api_key))
            .field("youtube_channel_id", &self.youtube_channel_id)
            .field("bluesky_handle", &self.bluesky_handle)
            .field("bluesky_credentials", &redact(&self.bluesky_credentials))
            .field("discord_webhook_url", &redact(&self.discord_webhook_url))
            .field("store_backend", &self.store_backend)
            .field("store_root", &self.store_root)
            .field("store_token", &redact(&self.store_token))
            .field("html_key", &self.html_key)
            .field("html_backup_key", &self.html_backup_key)
            .field("history_key", &self.history_key)
            .field("history_backup_key", &self.history_backup_key)
            .field("timezone", &self.timezone)
            .field("schedule", &self.schedule)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("http_user_agent", &self.http_user_agent)
            .field("http_max_retries", &self.http_max_retries)
            .field(
                "http_retry_backoff_base_secs",
                &self.http_retry_backoff_base_secs,
            )
            .field(
                "http_inter_request_delay_ms",
                &self.http_inter_request_delay_ms,
            )
            .finish()
    }
}
