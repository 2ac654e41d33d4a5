//! Shared `reqwest` plumbing: client construction, status mapping, and
//! JSON decoding.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::SourceError;

/// Longest response body excerpt kept in an error message.
const ERROR_BODY_LIMIT: usize = 300;

/// Timeouts, identity, and retry policy applied to every provider client.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub backoff_base_secs: u64,
    /// Pause between consecutive page requests of one listing.
    pub inter_request_delay_ms: u64,
}

impl HttpSettings {
    #[must_use]
    pub fn from_app_config(config: &coc_core::AppConfig) -> Self {
        Self {
            timeout_secs: config.http_timeout_secs,
            user_agent: config.http_user_agent.clone(),
            max_retries: config.http_max_retries,
            backoff_base_secs: config.http_retry_backoff_base_secs,
            inter_request_delay_ms: config.http_inter_request_delay_ms,
        }
    }

    /// Short timeout, no retries, no delay.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            timeout_secs: 5,
            user_agent: "commits-or-clout-test/0.1".to_owned(),
            max_retries: 0,
            backoff_base_secs: 0,
            inter_request_delay_ms: 0,
        }
    }

    /// Builds a `reqwest::Client` with this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the client cannot be constructed.
    pub fn build_client(&self) -> Result<Client, SourceError> {
        Ok(Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&self.user_agent)
            .build()?)
    }
}

/// Parses `base_url`, ensuring it ends with exactly one slash so relative
/// joins append to the path instead of replacing its last segment.
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] if `base_url` does not parse.
pub fn normalise_base_url(base_url: &str) -> Result<Url, SourceError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| SourceError::InvalidUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })
}

/// Joins a relative path onto a normalised base URL.
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] if the join fails.
pub fn join_url(base: &Url, path: &str) -> Result<Url, SourceError> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| SourceError::InvalidUrl {
            url: format!("{base}{path}"),
            reason: e.to_string(),
        })
}

/// URL without its query string, for logs and errors. Query strings carry
/// API keys (YouTube passes `key=` in the URL).
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.to_string()
}

/// Maps the HTTP status of `response` to a typed error, then decodes the
/// body as `T`.
///
/// # Errors
///
/// - [`SourceError::RateLimited`] on 429 (honouring `Retry-After`) and on a
///   403 whose `x-ratelimit-remaining` is `0`.
/// - [`SourceError::NotFound`] on 404.
/// - [`SourceError::UnexpectedStatus`] on any other non-2xx status.
/// - [`SourceError::Deserialize`] if the body is not valid JSON for `T`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    service: &'static str,
) -> Result<T, SourceError> {
    let response = check_status(response, service).await?;
    let url = redact_url(response.url());
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
        context: format!("{service} response from {url}"),
        source: e,
    })
}

/// Maps non-2xx responses to typed errors and passes successful ones
/// through untouched.
///
/// # Errors
///
/// See [`read_json`].
pub(crate) async fn check_status(
    response: Response,
    service: &'static str,
) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = redact_url(response.url());
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };

    let quota_exhausted =
        status == StatusCode::FORBIDDEN && header("x-ratelimit-remaining").as_deref() == Some("0");
    if status == StatusCode::TOO_MANY_REQUESTS || quota_exhausted {
        let retry_after_secs = header(reqwest::header::RETRY_AFTER.as_str())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(60);
        return Err(SourceError::RateLimited {
            service,
            retry_after_secs,
        });
    }

    if status == StatusCode::NOT_FOUND {
        return Err(SourceError::NotFound { service, url });
    }

    let body = response.text().await.unwrap_or_default();
    Err(SourceError::UnexpectedStatus {
        service,
        status: status.as_u16(),
        url,
        body: truncate(&body, ERROR_BODY_LIMIT),
    })
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_owned(),
    }
}
