//! One update run: fetch every counter, merge into the stored series,
//! render the dashboard, publish both artifacts, and report problems.
//!
//! Provider failures never abort a run; the affected counter falls back to
//! the most recent stored value. Storage and rendering failures do.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use coc_core::clock::{format_last_updated, local_now, to_fixed, year_start_utc};
use coc_core::{resolve_counts, AppConfig, DailyEntry, FetchedCounts};
use coc_render::{render_dashboard, DashboardContext, Profiles};
use coc_sources::{
    BlueskyClient, DiscordNotifier, GithubClient, HttpSettings, SourceError, TwitterClient,
    YoutubeClient,
};
use coc_store::{load_history, publish_html, save_history, ObjectStore};
use serde::Serialize;

use crate::alert;

/// A provider client paired with the account it reports on.
pub(crate) struct Account<C> {
    pub(crate) client: C,
    pub(crate) id: String,
}

/// Clients for every configured provider. Unconfigured social providers
/// are `None` and silently fall back.
pub(crate) struct Providers {
    pub(crate) github: GithubClient,
    pub(crate) twitter: Option<Account<TwitterClient>>,
    pub(crate) youtube: Option<Account<YoutubeClient>>,
    pub(crate) bluesky: Option<Account<BlueskyClient>>,
    pub(crate) discord: Option<DiscordNotifier>,
}

impl Providers {
    pub(crate) fn from_app_config(config: &AppConfig) -> Result<Self, SourceError> {
        let settings = HttpSettings::from_app_config(config);

        let github = GithubClient::new(&config.github_token, &config.github_username, &settings)?
            .with_organization(config.github_organization.clone());

        let twitter = config
            .twitter_account()
            .map(|(token, username)| {
                Ok::<_, SourceError>(Account {
                    client: TwitterClient::new(token, &settings)?,
                    id: username.to_owned(),
                })
            })
            .transpose()?;

        let youtube = config
            .youtube_channel()
            .map(|(key, channel)| {
                Ok::<_, SourceError>(Account {
                    client: YoutubeClient::new(key, &settings)?,
                    id: channel.to_owned(),
                })
            })
            .transpose()?;

        let bluesky = config
            .bluesky_handle
            .as_deref()
            .map(|handle| {
                Ok::<_, SourceError>(Account {
                    client: BlueskyClient::new(config.bluesky_credentials.as_deref(), &settings)?,
                    id: handle.to_owned(),
                })
            })
            .transpose()?;

        let discord = config
            .discord_webhook_url
            .as_deref()
            .map(|url| DiscordNotifier::new(url, &settings))
            .transpose()?;

        Ok(Self {
            github,
            twitter,
            youtube,
            bluesky,
            discord,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ProviderFailure {
    pub(crate) provider: &'static str,
    pub(crate) error: String,
}

#[derive(Debug, Default)]
pub(crate) struct FetchOutcome {
    pub(crate) counts: FetchedCounts,
    pub(crate) failures: Vec<ProviderFailure>,
    pub(crate) failed_repos: Vec<String>,
    pub(crate) repos_scanned: usize,
}

impl FetchOutcome {
    fn record<T>(&mut self, provider: &'static str, result: Result<T, SourceError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(provider, error = %e, "provider fetch failed");
                self.failures.push(ProviderFailure {
                    provider,
                    error: e.to_string(),
                });
                None
            }
        }
    }
}

/// Fetches the three social counters. GitHub is left unset.
pub(crate) async fn fetch_social_counts(providers: &Providers) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();

    if let Some(account) = &providers.twitter {
        let result = account.client.follower_count(&account.id).await;
        outcome.counts.twitter_followers = outcome.record("twitter", result);
    }
    if let Some(account) = &providers.youtube {
        let result = account.client.subscriber_count(&account.id).await;
        outcome.counts.youtube_subscribers = outcome.record("youtube", result);
    }
    if let Some(account) = &providers.bluesky {
        let result = account.client.follower_count(&account.id).await;
        outcome.counts.bluesky_followers = outcome.record("bluesky", result);
    }

    outcome
}

/// Fetches every counter, one provider after another.
pub(crate) async fn fetch_counts(providers: &Providers, since: DateTime<Utc>) -> FetchOutcome {
    let github = providers.github.count_commits_since(since).await;
    let mut outcome = fetch_social_counts(providers).await;
    if let Some(tally) = outcome.record("github", github) {
        outcome.counts.github_commits = Some(tally.total);
        outcome.failed_repos = tally.failed_repos;
        outcome.repos_scanned = tally.repos_scanned;
    }
    outcome
}

/// What a run did, printed as JSON by `coc run`.
#[derive(Debug, Serialize)]
pub(crate) struct RunReport {
    pub(crate) entry: DailyEntry,
    /// Metrics that reused the previous stored value (or 0).
    pub(crate) fell_back: Vec<&'static str>,
    pub(crate) failed_providers: Vec<ProviderFailure>,
    pub(crate) failed_repos: Vec<String>,
    pub(crate) repos_scanned: usize,
    pub(crate) written: bool,
    pub(crate) store: String,
}

/// Builds clients and storage from `config`, then performs one run at the
/// current local time.
pub(crate) async fn run_once(config: &AppConfig, dry_run: bool) -> anyhow::Result<RunReport> {
    let providers = Providers::from_app_config(config)?;
    let store = ObjectStore::from_app_config(config)?;
    run_update(
        config,
        &providers,
        &store,
        local_now(config.timezone),
        dry_run,
    )
    .await
}

/// Performs one run as of `now`.
///
/// # Errors
///
/// Storage or rendering failures. A best-effort Discord alert is sent
/// before the error is returned, except on dry runs.
pub(crate) async fn run_update(
    config: &AppConfig,
    providers: &Providers,
    store: &ObjectStore,
    now: DateTime<Tz>,
    dry_run: bool,
) -> anyhow::Result<RunReport> {
    match execute(config, providers, store, now, dry_run).await {
        Ok(report) => Ok(report),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "run failed");
            if !dry_run {
                let message = alert::run_failed(now.date_naive(), &e);
                alert::send(providers.discord.as_ref(), &message).await;
            }
            Err(e)
        }
    }
}

async fn execute(
    config: &AppConfig,
    providers: &Providers,
    store: &ObjectStore,
    now: DateTime<Tz>,
    dry_run: bool,
) -> anyhow::Result<RunReport> {
    let today = now.date_naive();
    let since = year_start_utc(today.year(), config.timezone)?;
    tracing::info!(%today, %since, dry_run, store = %store.describe(), "starting run");

    let mut history = load_history(store, &config.history_key, &config.history_backup_key).await?;
    let outcome = fetch_counts(providers, since).await;

    let previous = history.fallback_for(today);
    let (counts, fell_back) = resolve_counts(&outcome.counts, previous.as_ref());
    for metric in &fell_back {
        tracing::info!(%metric, "using previous value");
    }

    let entry = DailyEntry::new(today, counts, to_fixed(&now));
    history.upsert(entry.clone());
    tracing::info!(
        github_commits = entry.github_commits,
        total_followers = entry.total_followers,
        ratio = entry.ratio,
        "merged today's entry"
    );

    let last_updated = format_last_updated(&now);
    let html = render_dashboard(&DashboardContext {
        current: &entry,
        history: &history,
        profiles: profiles(config),
        last_updated: &last_updated,
    })?;

    if dry_run {
        tracing::info!(bytes = html.len(), "dry run: skipping storage writes");
    } else {
        save_history(store, &history, &config.history_key, &config.history_backup_key).await?;
        publish_html(store, &html, &config.html_key, &config.html_backup_key).await?;
    }

    if let Some(message) =
        alert::provider_problems(today, &outcome.failures, &outcome.failed_repos)
    {
        if dry_run {
            tracing::warn!(%message, "dry run: not sending alert");
        } else {
            alert::send(providers.discord.as_ref(), &message).await;
        }
    }

    Ok(RunReport {
        entry,
        fell_back: fell_back.iter().map(|m| m.as_str()).collect(),
        failed_providers: outcome.failures,
        failed_repos: outcome.failed_repos,
        repos_scanned: outcome.repos_scanned,
        written: !dry_run,
        store: store.describe(),
    })
}

/// Footer profile links for the configured accounts.
pub(crate) fn profiles(config: &AppConfig) -> Profiles<'_> {
    Profiles {
        github_username: &config.github_username,
        twitter_username: config.twitter_account().map(|(_, username)| username),
        youtube_channel_id: config.youtube_channel().map(|(_, channel)| channel),
        bluesky_handle: config.bluesky_handle.as_deref(),
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
