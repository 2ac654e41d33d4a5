use chrono_tz::Tz;

use crate::app_config::{AppConfig, StoreBackend};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Blank values are treated the same as unset ones, so a `.env` line like
/// `YOUTUBE_API_KEY=` disables YouTube instead of sending an empty key.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let require = |var: &str| -> Result<String, ConfigError> {
        optional(var).ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default =
        |var: &str, default: &str| -> String { optional(var).unwrap_or_else(|| default.to_string()) };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    // A credential without its account name (or vice versa) is a
    // misconfiguration, not a disabled provider.
    let paired = |secret_var: &str,
                  name_var: &str|
     -> Result<(Option<String>, Option<String>), ConfigError> {
        match (optional(secret_var), optional(name_var)) {
            (Some(_), None) => Err(ConfigError::MissingEnvVar(name_var.to_string())),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar(secret_var.to_string())),
            pair => Ok(pair),
        }
    };

    let github_token = require("GITHUB_TOKEN")?;
    let github_username = require("GITHUB_USERNAME")?;
    let store_root = require("COC_STORE_ROOT")?;

    let log_level = or_default("COC_LOG_LEVEL", "info");
    let github_organization = optional("GITHUB_ORGANIZATION");

    let (twitter_bearer_token, twitter_username) =
        paired("TWITTER_BEARER_TOKEN", "TWITTER_USERNAME")?;
    let (youtube_api_key, youtube_channel_id) = paired("YOUTUBE_API_KEY", "YOUTUBE_CHANNEL_ID")?;

    let bluesky_handle = optional("BLUESKY_HANDLE");
    let bluesky_credentials = optional("BLUESKY_API_KEY");
    if let Some(creds) = &bluesky_credentials {
        if !creds.contains(':') {
            return Err(ConfigError::InvalidEnvVar {
                var: "BLUESKY_API_KEY".to_string(),
                reason: "expected the form identifier:password".to_string(),
            });
        }
        if bluesky_handle.is_none() {
            return Err(ConfigError::MissingEnvVar("BLUESKY_HANDLE".to_string()));
        }
    }

    let discord_webhook_url = optional("DISCORD_WEBHOOK_URL");

    let store_backend = parse_store_backend(&or_default("COC_STORE_BACKEND", "local"))?;
    let store_token = optional("COC_STORE_TOKEN");
    let html_key = or_default("COC_HTML_KEY", "index.html");
    let html_backup_key = or_default("COC_HTML_BACKUP_KEY", "index_backup.html");
    let history_key = or_default("COC_HISTORY_KEY", "historical_data.json");
    let history_backup_key = or_default("COC_HISTORY_BACKUP_KEY", "historical_data_backup.json");

    let timezone = parse_timezone(&or_default("COC_TIMEZONE", "America/Los_Angeles"))?;
    let schedule = or_default("COC_SCHEDULE", "0 */30 * * * *");

    let http_timeout_secs = parse_u64("COC_HTTP_TIMEOUT_SECS", "30")?;
    let http_user_agent = or_default("COC_HTTP_USER_AGENT", "commits-or-clout/0.1");
    let http_max_retries = parse_u32("COC_HTTP_MAX_RETRIES", "3")?;
    let http_retry_backoff_base_secs = parse_u64("COC_HTTP_RETRY_BACKOFF_BASE_SECS", "2")?;
    let http_inter_request_delay_ms = parse_u64("COC_HTTP_INTER_REQUEST_DELAY_MS", "0")?;

    Ok(AppConfig {
        log_level,
        github_token,
        github_username,
        github_organization,
        twitter_bearer_token,
        twitter_username,
        youtube_api_key,
        youtube_channel_id,
        bluesky_handle,
        bluesky_credentials,
        discord_webhook_url,
        store_backend,
        store_root,
        store_token,
        html_key,
        html_backup_key,
        history_key,
        history_backup_key,
        timezone,
        schedule,
        http_timeout_secs,
        http_user_agent,
        http_max_retries,
        http_retry_backoff_base_secs,
        http_inter_request_delay_ms,
    })
}

fn parse_store_backend(s: &str) -> Result<StoreBackend, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "local" => Ok(StoreBackend::Local),
        "http" => Ok(StoreBackend::Http),
        other => Err(ConfigError::InvalidEnvVar {
            var: "COC_STORE_BACKEND".to_string(),
            reason: format!("expected local or http; got \"{other}\""),
        }),
    }
}

fn parse_timezone(s: &str) -> Result<Tz, ConfigError> {
    s.parse::<Tz>().map_err(|e| ConfigError::InvalidEnvVar {
        var: "COC_TIMEZONE".to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
