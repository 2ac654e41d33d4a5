//! Discord alert messages for degraded or failed runs.

use chrono::NaiveDate;
use coc_sources::DiscordNotifier;

use crate::pipeline::ProviderFailure;

/// Repositories listed individually before the rest are summarized.
const MAX_LISTED_REPOS: usize = 10;

/// One message covering every provider failure and skipped repository of
/// a run, or `None` when the run was clean.
pub(crate) fn provider_problems(
    date: NaiveDate,
    failures: &[ProviderFailure],
    failed_repos: &[String],
) -> Option<String> {
    if failures.is_empty() && failed_repos.is_empty() {
        return None;
    }

    let mut lines = vec![format!(
        "Commits or Clout run for {date} used fallback values:"
    )];
    for failure in failures {
        lines.push(format!("- {} failed: {}", failure.provider, failure.error));
    }
    if !failed_repos.is_empty() {
        let mut listed = failed_repos
            .iter()
            .take(MAX_LISTED_REPOS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if failed_repos.len() > MAX_LISTED_REPOS {
            listed.push_str(&format!(
                " and {} more",
                failed_repos.len() - MAX_LISTED_REPOS
            ));
        }
        lines.push(format!(
            "- github skipped {} repositories: {listed}",
            failed_repos.len()
        ));
    }
    Some(lines.join("\n"))
}

pub(crate) fn run_failed(date: NaiveDate, error: &anyhow::Error) -> String {
    format!("Commits or Clout run for {date} failed: {error:#}")
}

/// Sends `message` if a webhook is configured. Failures are logged only.
pub(crate) async fn send(discord: Option<&DiscordNotifier>, message: &str) {
    let Some(discord) = discord else {
        tracing::warn!(%message, "no Discord webhook configured; alert not sent");
        return;
    };
    if let Err(e) = discord.notify(message).await {
        tracing::error!(error = %e, "failed to send Discord alert");
    }
}
