//! Live provider checks that print values without touching storage.

use chrono::Datelike;
use coc_core::clock::{local_now, year_start_utc};
use coc_core::AppConfig;
use coc_sources::SourceError;

use crate::pipeline::{Account, Providers};
use crate::Provider;

/// Queries the selected provider(s) and prints one line each.
///
/// # Errors
///
/// Client construction failures, or any checked provider failing.
pub(crate) async fn run_check(config: &AppConfig, provider: Provider) -> anyhow::Result<()> {
    let providers = Providers::from_app_config(config)?;
    let wants = |p: Provider| provider == Provider::All || provider == p;
    let mut failed = Vec::new();

    if wants(Provider::Github) {
        let tz = config.timezone;
        let since = year_start_utc(local_now(tz).year(), tz)?;
        match providers.github.count_commits_since(since).await {
            Ok(tally) => {
                println!(
                    "github: {} commits since {since} ({} repositories scanned)",
                    tally.total, tally.repos_scanned
                );
                for repo in &tally.failed_repos {
                    println!("github: skipped {repo}");
                }
            }
            Err(e) => report_failure("github", &e, &mut failed),
        }
    }

    if wants(Provider::Twitter) {
        check_account("twitter", providers.twitter.as_ref(), &mut failed, |a| {
            a.client.follower_count(&a.id)
        })
        .await;
    }
    if wants(Provider::Youtube) {
        check_account("youtube", providers.youtube.as_ref(), &mut failed, |a| {
            a.client.subscriber_count(&a.id)
        })
        .await;
    }
    if wants(Provider::Bluesky) {
        check_account("bluesky", providers.bluesky.as_ref(), &mut failed, |a| {
            a.client.follower_count(&a.id)
        })
        .await;
    }

    if !failed.is_empty() {
        anyhow::bail!("provider check failed: {}", failed.join(", "));
    }
    Ok(())
}

async fn check_account<'a, C, F, Fut>(
    name: &'static str,
    account: Option<&'a Account<C>>,
    failed: &mut Vec<&'static str>,
    fetch: F,
) where
    F: FnOnce(&'a Account<C>) -> Fut,
    Fut: std::future::Future<Output = Result<u64, SourceError>>,
{
    let Some(account) = account else {
        println!("{name}: not configured");
        return;
    };
    match fetch(account).await {
        Ok(count) => println!("{name}: {count} ({})", account.id),
        Err(e) => report_failure(name, &e, failed),
    }
}

fn report_failure(name: &'static str, error: &SourceError, failed: &mut Vec<&'static str>) {
    tracing::error!(provider = name, error = %error, "provider check failed");
    println!("{name}: error: {error}");
    failed.push(name);
}
